// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - Settings persistence
//
// Settings are stored in a local JSON file next to the other per-user
// configuration. Nothing about the marketplace itself is persisted here.

use crate::types::{AppError, AppSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// In-memory cache of settings, persisted to disk on changes
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Open the settings file in the user's config directory
    pub fn new() -> Result<Self, AppError> {
        let file_path = Self::get_settings_path()?;
        Self::with_path(file_path)
    }

    /// Open a settings file at an explicit location, creating it with
    /// defaults if it does not exist yet
    pub fn with_path(file_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let file_path = file_path.into();
        tracing::info!("Settings file path: {:?}", file_path);

        let settings = if file_path.exists() {
            tracing::info!("Loading settings from disk");
            let content = fs::read_to_string(&file_path)
                .map_err(|e| AppError::FileIo(format!("Failed to read settings: {}", e)))?;

            serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {}", e);
                AppSettings::default()
            })
        } else {
            tracing::info!("No settings file found, using defaults");
            AppSettings::default()
        };

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };

        if !store.file_path.exists() {
            tracing::info!("Creating initial settings file");
            store.persist()?;
        }

        Ok(store)
    }

    /// Get the path to the settings file
    fn get_settings_path() -> Result<PathBuf, AppError> {
        let config_dir = directories::ProjectDirs::from("kr", "simcar", "simcar")
            .ok_or_else(|| AppError::FileIo("Could not determine config directory".to_string()))?
            .config_dir()
            .to_path_buf();

        Ok(config_dir.join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Persist settings to disk
    fn persist(&self) -> Result<(), AppError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::FileIo(format!("Failed to create config dir: {}", e)))?;
        }

        let content = {
            let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*settings).map_err(|e| {
                AppError::Serialization(format!("Failed to serialize settings: {}", e))
            })?
        };

        fs::write(&self.file_path, content)
            .map_err(|e| AppError::FileIo(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> AppSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate, replace and persist settings
    pub fn update(&self, new_settings: AppSettings) -> Result<(), AppError> {
        new_settings.validate()?;
        tracing::info!("Updating settings, API base URL: {}", new_settings.api_base_url);
        {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            *settings = new_settings;
        }

        let result = self.persist();
        if result.is_ok() {
            tracing::info!("Settings persisted successfully");
        } else {
            tracing::error!("Failed to persist settings: {:?}", result);
        }
        result
    }
}
