// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - Shared logic for all frontends
//
// This crate provides:
// - Listing, account and settings types plus AppError
// - Client-side listing search (filter_listings)
// - Favorite state reconciliation (FavoriteReconciler)
// - MarketplaceClient for the REST backend
// - SettingsStore for persistent settings
//
// Frontend-specific code lives in separate crates.

pub mod client;
pub mod favorites;
pub mod filter;
pub mod settings;
pub mod types;

// Re-export commonly used items
pub use client::MarketplaceClient;
pub use favorites::{FavoriteAction, FavoriteReconciler, FavoriteState, FavoritesApi, ToggleOutcome};
pub use filter::{filter_listings, FilterCriteria, NO_PRICE_LIMIT};
pub use settings::SettingsStore;
pub use types::{
    AppError, AppSettings, Credentials, Diagnosis, Listing, ListingDraft, MemberProfile,
    ProfileUpdate, SignUpRequest, DEFAULT_API_BASE_URL,
};
