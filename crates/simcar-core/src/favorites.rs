// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - Favorite state reconciliation
//
// The server owns favorites. The client caches one state per listing,
// decides which remote call a toggle needs and only changes the cached state
// once that call has succeeded.

use crate::types::{AppError, Listing};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Remote favorites operations the reconciler depends on
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    /// Listings the authenticated member has favorited
    async fn list_favorites(&self) -> Result<Vec<Listing>, AppError>;

    /// Mark a listing as favorite
    async fn add_favorite(&self, listing_id: i64) -> Result<(), AppError>;

    /// Remove a listing from the favorites
    async fn remove_favorite(&self, listing_id: i64) -> Result<(), AppError>;
}

/// Cached favorite state of one listing for the current member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteState {
    /// Not loaded yet
    #[default]
    Unknown,
    NotFavorite,
    Favorite,
}

/// What a toggle requires the caller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    /// The member is logged out; no remote call is made
    RequireLogin,
    AddFavorite(i64),
    RemoveFavorite(i64),
}

impl FavoriteState {
    /// Initial state from a snapshot of the server's favorite ids
    pub fn from_snapshot(listing_id: i64, server_favorite_ids: &[i64]) -> Self {
        if server_favorite_ids.contains(&listing_id) {
            Self::Favorite
        } else {
            Self::NotFavorite
        }
    }

    pub fn is_favorite(&self) -> bool {
        matches!(self, Self::Favorite)
    }

    /// Decide the action for a user toggle.
    ///
    /// `Unknown` toggles like `NotFavorite`.
    pub fn toggle(self, listing_id: i64, is_logged_in: bool) -> FavoriteAction {
        if !is_logged_in {
            return FavoriteAction::RequireLogin;
        }
        match self {
            Self::Favorite => FavoriteAction::RemoveFavorite(listing_id),
            Self::NotFavorite | Self::Unknown => FavoriteAction::AddFavorite(listing_id),
        }
    }

    /// State after the remote call for `action` finished.
    /// Failures leave the state untouched.
    pub fn apply_result(self, action: &FavoriteAction, success: bool) -> Self {
        if !success {
            return self;
        }
        match action {
            FavoriteAction::AddFavorite(_) => Self::Favorite,
            FavoriteAction::RemoveFavorite(_) => Self::NotFavorite,
            FavoriteAction::RequireLogin => self,
        }
    }
}

/// Result of a toggle issued through [`FavoriteReconciler`]
#[derive(Debug)]
pub enum ToggleOutcome {
    /// Logged out; the caller should send the member to login
    LoginRequired,
    /// The server confirmed the change
    Applied {
        action: FavoriteAction,
        state: FavoriteState,
    },
    /// The remote call failed; `state` is the unchanged pre-toggle state
    Failed {
        action: FavoriteAction,
        state: FavoriteState,
        error: AppError,
    },
}

impl ToggleOutcome {
    /// State to display after the toggle, if any
    pub fn state(&self) -> Option<FavoriteState> {
        match self {
            Self::LoginRequired => None,
            Self::Applied { state, .. } | Self::Failed { state, .. } => Some(*state),
        }
    }
}

/// Cached state of one listing. `version` counts every write to `state`.
#[derive(Debug, Default)]
struct Slot {
    state: FavoriteState,
    version: u64,
}

impl Slot {
    fn set(&mut self, state: FavoriteState) {
        self.state = state;
        self.version += 1;
    }
}

type StateSlot = Arc<tokio::sync::Mutex<Slot>>;

/// Tracks favorite states per listing and drives the remote calls.
///
/// Each listing has its own async lock, held across the remote call, so two
/// toggles on the same listing never race: the second one sees the state the
/// first one left behind.
pub struct FavoriteReconciler<A> {
    api: Arc<A>,
    states: Mutex<HashMap<i64, StateSlot>>,
}

impl<A: FavoritesApi> FavoriteReconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, listing_id: i64) -> StateSlot {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        states.entry(listing_id).or_default().clone()
    }

    fn tracked_slots(&self) -> Vec<(i64, StateSlot)> {
        let states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        states.iter().map(|(id, slot)| (*id, slot.clone())).collect()
    }

    /// Cached state, `Unknown` if the listing was never loaded
    pub async fn state(&self, listing_id: i64) -> FavoriteState {
        self.slot(listing_id).lock().await.state
    }

    /// Load the state of one listing from the server's favorite list.
    ///
    /// Logged-out members are never favorites and no request is made. A failed
    /// fetch leaves the listing `NotFavorite` and returns the error.
    pub async fn load(&self, listing_id: i64, is_logged_in: bool) -> Result<FavoriteState, AppError> {
        let slot = self.slot(listing_id);
        let mut slot = slot.lock().await;

        if !is_logged_in {
            slot.set(FavoriteState::NotFavorite);
            return Ok(slot.state);
        }

        match self.api.list_favorites().await {
            Ok(favorites) => {
                let ids: Vec<i64> = favorites.iter().map(|l| l.id).collect();
                slot.set(FavoriteState::from_snapshot(listing_id, &ids));
                tracing::info!("Listing {} favorite state loaded: {:?}", listing_id, slot.state);
                Ok(slot.state)
            }
            Err(e) => {
                tracing::warn!("Failed to load favorites for listing {}: {}", listing_id, e);
                slot.set(FavoriteState::NotFavorite);
                Err(e)
            }
        }
    }

    /// Fetch the favorite list once and update every tracked listing from it.
    ///
    /// A listing written while the list was in flight (a confirmed toggle or
    /// a load) keeps that newer state.
    pub async fn refresh(&self) -> Result<Vec<Listing>, AppError> {
        let mut seen = HashMap::new();
        for (listing_id, slot) in self.tracked_slots() {
            seen.insert(listing_id, slot.lock().await.version);
        }

        let favorites = self.api.list_favorites().await?;
        let ids: Vec<i64> = favorites.iter().map(|l| l.id).collect();

        for id in &ids {
            self.slot(*id);
        }
        for (listing_id, slot) in self.tracked_slots() {
            let mut slot = slot.lock().await;
            if slot.version != seen.get(&listing_id).copied().unwrap_or_default() {
                tracing::debug!("Listing {} changed during refresh, keeping {:?}", listing_id, slot.state);
                continue;
            }
            slot.set(FavoriteState::from_snapshot(listing_id, &ids));
        }

        tracing::info!("Favorites refreshed: {} listings", ids.len());
        Ok(favorites)
    }

    /// Toggle the favorite state of a listing.
    ///
    /// At most one remote call is issued. The cached state only changes when
    /// that call succeeds. If the returned future is dropped before the call
    /// completes, the state is left as it was.
    pub async fn toggle(&self, listing_id: i64, is_logged_in: bool) -> ToggleOutcome {
        let slot = self.slot(listing_id);
        let mut slot = slot.lock().await;

        let action = slot.state.toggle(listing_id, is_logged_in);
        let result = match action {
            FavoriteAction::RequireLogin => return ToggleOutcome::LoginRequired,
            FavoriteAction::AddFavorite(id) => self.api.add_favorite(id).await,
            FavoriteAction::RemoveFavorite(id) => self.api.remove_favorite(id).await,
        };

        match result {
            Ok(()) => {
                let confirmed = slot.state.apply_result(&action, true);
                slot.set(confirmed);
                tracing::info!("{:?} confirmed, listing {} is now {:?}", action, listing_id, slot.state);
                ToggleOutcome::Applied {
                    action,
                    state: slot.state,
                }
            }
            Err(error) => {
                tracing::warn!("{:?} failed for listing {}: {}", action, listing_id, error);
                ToggleOutcome::Failed {
                    action,
                    state: slot.state.apply_result(&action, false),
                    error,
                }
            }
        }
    }

    /// Mark every cached state `Unknown`, e.g. after logout.
    ///
    /// Waits for toggles already in flight, so none of them lands after the
    /// reset.
    pub async fn reset(&self) {
        for (_, slot) in self.tracked_slots() {
            slot.lock().await.set(FavoriteState::Unknown);
        }
    }
}
