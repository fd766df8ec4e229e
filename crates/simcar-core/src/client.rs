// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - HTTP client for the marketplace backend
//
// One client per app session. The backend tracks login with a session
// cookie, so the client keeps its own cookie store.

use crate::favorites::FavoritesApi;
use crate::types::{
    AppError, AppSettings, Credentials, Diagnosis, Listing, ListingDraft, MemberProfile,
    ProfileUpdate, SignUpRequest,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the SimCar REST API
pub struct MarketplaceClient {
    http_client: Client,
    base_url: String,
    newest_first: bool,
}

impl MarketplaceClient {
    pub fn new(settings: &AppSettings) -> Result<Self, AppError> {
        settings.validate()?;

        let http_client = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.api_base_url.trim().trim_end_matches('/').to_string(),
            newest_first: settings.newest_first,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn any non-2xx status into `AppError::Server`
    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

        tracing::warn!("Request failed with {}: {}", status, message);
        Err(AppError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.url(path);
        tracing::info!("GET {}", url);
        let response = self.send(self.http_client.get(&url)).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::Serialization(format!("Failed to parse {}: {}", path, e)))
    }

    // Cars

    /// All listings. Newest first unless disabled in settings.
    pub async fn list_cars(&self) -> Result<Vec<Listing>, AppError> {
        let mut listings: Vec<Listing> = self.get_json("/cars").await?;
        if self.newest_first {
            listings.reverse();
        }
        tracing::info!("Fetched {} listings", listings.len());
        Ok(listings)
    }

    pub async fn get_car(&self, listing_id: i64) -> Result<Listing, AppError> {
        self.get_json(&format!("/cars/{}", listing_id)).await
    }

    /// Register a new listing for the logged-in member
    pub async fn register_car(&self, draft: &ListingDraft) -> Result<(), AppError> {
        let url = self.url("/cars");
        tracing::info!("POST {} ({})", url, draft.car_number);
        self.send(self.http_client.post(&url).json(draft)).await?;
        Ok(())
    }

    pub async fn update_car(&self, listing_id: i64, draft: &ListingDraft) -> Result<(), AppError> {
        let url = self.url(&format!("/cars/{}", listing_id));
        tracing::info!("PUT {}", url);
        self.send(self.http_client.put(&url).json(draft)).await?;
        Ok(())
    }

    pub async fn delete_car(&self, listing_id: i64) -> Result<(), AppError> {
        let url = self.url(&format!("/cars/{}", listing_id));
        tracing::info!("DELETE {}", url);
        self.send(self.http_client.delete(&url)).await?;
        Ok(())
    }

    pub async fn diagnose_car(&self, listing_id: i64) -> Result<Diagnosis, AppError> {
        self.get_json(&format!("/cars/{}/diagnosis", listing_id)).await
    }

    // Members

    /// Log in. On success the session cookie is kept for later requests.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), AppError> {
        let url = self.url("/members/login");
        tracing::info!("Logging in as {}", credentials.email);
        self.send(self.http_client.post(&url).json(credentials)).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        let url = self.url("/members/logout");
        tracing::info!("Logging out");
        self.send(self.http_client.post(&url)).await?;
        Ok(())
    }

    pub async fn join(&self, request: &SignUpRequest) -> Result<(), AppError> {
        let url = self.url("/members/join");
        tracing::info!("Registering member {}", request.email);
        self.send(self.http_client.post(&url).json(request)).await?;
        Ok(())
    }

    pub async fn profile(&self) -> Result<MemberProfile, AppError> {
        self.get_json("/members/profile").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AppError> {
        let url = self.url("/members/profile");
        tracing::info!("PUT {}", url);
        self.send(self.http_client.put(&url).json(update)).await?;
        Ok(())
    }

    /// Delete the logged-in member's account
    pub async fn delete_account(&self) -> Result<(), AppError> {
        let url = self.url("/members/profile");
        tracing::info!("DELETE {}", url);
        self.send(self.http_client.delete(&url)).await?;
        Ok(())
    }

    /// Listings registered by the logged-in member
    pub async fn sales(&self) -> Result<Vec<Listing>, AppError> {
        self.get_json("/members/sales").await
    }
}

#[async_trait]
impl FavoritesApi for MarketplaceClient {
    async fn list_favorites(&self) -> Result<Vec<Listing>, AppError> {
        self.get_json("/members/favorites").await
    }

    async fn add_favorite(&self, listing_id: i64) -> Result<(), AppError> {
        let url = self.url(&format!("/favorites/{}", listing_id));
        tracing::info!("POST {}", url);
        self.send(self.http_client.post(&url)).await?;
        Ok(())
    }

    async fn remove_favorite(&self, listing_id: i64) -> Result<(), AppError> {
        let url = self.url(&format!("/favorites/{}", listing_id));
        tracing::info!("DELETE {}", url);
        self.send(self.http_client.delete(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let settings = AppSettings {
            api_base_url: "http://localhost:8080/api/".to_string(),
            ..AppSettings::default()
        };
        let client = MarketplaceClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/cars"), "http://localhost:8080/api/cars");
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = AppSettings {
            api_base_url: "ftp://example.com".to_string(),
            ..AppSettings::default()
        };
        assert!(matches!(
            MarketplaceClient::new(&settings),
            Err(AppError::InvalidConfig(_))
        ));
    }
}
