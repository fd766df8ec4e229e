// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - Type definitions

use serde::{Deserialize, Serialize};

/// Default backend base URL, including the `/api` prefix
pub const DEFAULT_API_BASE_URL: &str = "http://54.180.92.197:8080/api";

/// A single car-for-sale record as exposed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Server-assigned identifier
    pub id: i64,
    /// Body type, e.g. "SUV" or "Sedan"
    #[serde(rename = "type", default)]
    pub car_type: String,
    #[serde(default)]
    pub image_url: String,
    /// Manufacturer
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Asking price in whole currency units
    pub price: i64,
    #[serde(default)]
    pub car_number: Option<String>,
    #[serde(default)]
    pub insurance_history: Option<i32>,
    #[serde(default)]
    pub inspection_history: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Listing {
    /// "{brand} {model}"
    pub fn title(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }

    /// Resolve the image URL against the backend origin.
    ///
    /// Absolute URLs are returned unchanged and protocol-relative ones (`//cdn/..`)
    /// take the scheme of `base_url`. Relative paths are joined onto the scheme
    /// and authority of `base_url` (its path, e.g. `/api`, is dropped).
    pub fn full_image_url(&self, base_url: &str) -> Option<String> {
        let image = self.image_url.trim();
        if image.is_empty() {
            return None;
        }
        if image.starts_with("http://") || image.starts_with("https://") {
            return Some(image.to_string());
        }
        if image.starts_with("//") {
            let scheme = base_url.split_once("://").map_or("http", |(scheme, _)| scheme);
            return Some(format!("{}:{}", scheme, image));
        }

        let origin = match base_url.find("://") {
            Some(scheme_end) => {
                let authority_start = scheme_end + 3;
                match base_url[authority_start..].find('/') {
                    Some(path_start) => &base_url[..authority_start + path_start],
                    None => base_url,
                }
            }
            None => base_url.trim_end_matches('/'),
        };

        Some(format!("{}/{}", origin, image.trim_start_matches('/')))
    }
}

/// Body for registering or editing a listing.
/// Server-owned fields (id, seller, timestamps) are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    #[serde(rename = "type")]
    pub car_type: String,
    pub image_url: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i64,
    pub fuel_type: String,
    pub price: i64,
    pub car_number: String,
    pub insurance_history: i32,
    pub inspection_history: i32,
    pub color: String,
    pub transmission: String,
    pub region: String,
    pub contact_number: String,
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Member registration request body
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
}

/// Profile of the authenticated member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub email: String,
    pub name: String,
    pub phone: String,
}

/// Profile edit body. The password is only sent when changing it.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Automated reliability assessment for a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub car_id: i64,
    pub reliability_score: i32,
    pub evaluation_comment: String,
}

/// Application settings (frontend-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Backend base URL including the `/api` prefix
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Show the most recently registered listings first
    #[serde(default = "default_newest_first")]
    pub newest_first: bool,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_newest_first() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            newest_first: default_newest_first(),
        }
    }
}

impl AppSettings {
    /// Check that the settings can be used to build a client
    pub fn validate(&self) -> Result<(), AppError> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(AppError::InvalidConfig("API base URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::InvalidConfig(format!(
                "API base URL must start with http:// or https://: {}",
                url
            )));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "Timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppError {
    /// HTTP status for server-side failures
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            AppError::ConnectionRefused(err.to_string())
        } else if err.is_timeout() {
            AppError::Network(format!("Request timed out: {}", err))
        } else if err.is_decode() {
            AppError::Serialization(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}
