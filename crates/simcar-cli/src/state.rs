// SPDX-License-Identifier: AGPL-3.0
// SimCar CLI - Session state

use simcar_core::{
    AppError, FavoriteReconciler, FilterCriteria, Listing, MarketplaceClient, SettingsStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Everything the shell keeps between commands
pub struct AppState {
    pub settings: SettingsStore,
    pub client: Arc<MarketplaceClient>,
    pub favorites: FavoriteReconciler<MarketplaceClient>,
    logged_in: AtomicBool,
    /// Last fetched listing set, replaced wholesale on refresh
    listings: RwLock<Vec<Listing>>,
    criteria: RwLock<FilterCriteria>,
}

impl AppState {
    /// Create state from the user's settings file.
    /// `api_url` overrides the stored base URL for this session only.
    pub fn new(api_url: Option<String>) -> Result<Self, AppError> {
        Self::with_settings(SettingsStore::new()?, api_url)
    }

    pub fn with_settings(settings: SettingsStore, api_url: Option<String>) -> Result<Self, AppError> {
        let mut effective = settings.get();
        if let Some(url) = api_url {
            tracing::info!("Using API base URL override: {}", url);
            effective.api_base_url = url;
        }

        let client = Arc::new(MarketplaceClient::new(&effective)?);
        let favorites = FavoriteReconciler::new(client.clone());

        Ok(Self {
            settings,
            client,
            favorites,
            logged_in: AtomicBool::new(false),
            listings: RwLock::new(Vec::new()),
            criteria: RwLock::new(FilterCriteria::default()),
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    /// Record a login or logout. Cached favorite states belong to the
    /// previous member and are dropped either way.
    pub async fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::SeqCst);
        self.favorites.reset().await;
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.listings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_listings(&self, listings: Vec<Listing>) {
        *self.listings.write().unwrap_or_else(PoisonError::into_inner) = listings;
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.criteria
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_criteria(&self, update: impl FnOnce(&mut FilterCriteria)) {
        let mut criteria = self.criteria.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut criteria);
    }
}
