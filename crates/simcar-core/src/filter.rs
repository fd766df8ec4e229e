// SPDX-License-Identifier: AGPL-3.0
// SimCar Core - Client-side listing search
//
// Filtering is a pure conjunction of field predicates over an in-memory
// listing set. The frontend owns the criteria and re-runs the filter on
// every change.

use crate::types::Listing;
use serde::{Deserialize, Serialize};

/// Maximum price value; a ceiling at or above it disables price filtering
pub const NO_PRICE_LIMIT: i64 = 200_000_000;

/// User-entered search constraints for a browsing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Substring of the brand
    pub manufacturer: String,
    /// Substring of the model name
    pub model: String,
    /// Exact model year as typed, e.g. "2020"
    pub year: String,
    /// Substring of the body type
    pub car_type: String,
    /// Substring of the region
    pub region: String,
    /// Price ceiling, inclusive
    pub max_price: i64,
    /// Substring of the fuel type (not part of the default search form)
    #[serde(default)]
    pub fuel_type: String,
    /// Mileage ceiling, inclusive (not part of the default search form)
    #[serde(default)]
    pub max_mileage: Option<i64>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            manufacturer: String::new(),
            model: String::new(),
            year: String::new(),
            car_type: String::new(),
            region: String::new(),
            max_price: NO_PRICE_LIMIT,
            fuel_type: String::new(),
            max_mileage: None,
        }
    }
}

impl FilterCriteria {
    /// True when no field constrains the result
    pub fn is_unfiltered(&self) -> bool {
        self.manufacturer.is_empty()
            && self.model.is_empty()
            && self.year.is_empty()
            && self.car_type.is_empty()
            && self.region.is_empty()
            && !self.has_price_limit()
            && self.fuel_type.is_empty()
            && self.max_mileage.is_none()
    }

    pub fn has_price_limit(&self) -> bool {
        self.max_price < NO_PRICE_LIMIT
    }

    /// Check a single listing against every predicate
    pub fn matches(&self, listing: &Listing) -> bool {
        contains_or_empty(Some(&listing.brand), &self.manufacturer)
            && contains_or_empty(Some(&listing.model), &self.model)
            && (self.year.is_empty() || listing.year.to_string() == self.year)
            && contains_or_empty(Some(&listing.car_type), &self.car_type)
            && contains_or_empty(listing.region.as_deref(), &self.region)
            && (!self.has_price_limit() || listing.price <= self.max_price)
            && contains_or_empty(listing.fuel_type.as_deref(), &self.fuel_type)
            && match self.max_mileage {
                Some(limit) => listing.mileage.is_some_and(|m| m <= limit),
                None => true,
            }
    }
}

/// Case-insensitive substring match; an empty needle always matches and a
/// missing field never matches a non-empty needle.
fn contains_or_empty(field: Option<&str>, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    match field {
        Some(value) => value.to_lowercase().contains(&needle.to_lowercase()),
        None => false,
    }
}

/// Return the listings matching `criteria`, preserving their order
pub fn filter_listings<'a>(listings: &'a [Listing], criteria: &FilterCriteria) -> Vec<&'a Listing> {
    let matched: Vec<&Listing> = listings.iter().filter(|l| criteria.matches(l)).collect();
    tracing::debug!("Filter matched {} of {} listings", matched.len(), listings.len());
    matched
}
