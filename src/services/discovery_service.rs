//! Discovery search domain: nearby-animal queries with regional caching.

use thiserror::Error;

use crate::constants::DISTANCE_BUCKETS_METERS;
use crate::constants::geohash::{PRECISION_IP_DERIVED, PRECISION_PRECISE};
use crate::domain::Gender;
use crate::models::AdoptableAnimal;

/// Attribute and location filters for a discovery search. Latitude and
/// longitude are always populated by the time the service runs; the caller
/// resolves IP-derived coordinates first.
#[derive(Debug, Clone)]
pub struct AnimalFilters {
    pub gender: Option<Gender>,
    pub neutered: Option<bool>,
    pub min_age_weeks: i32,
    pub max_age_weeks: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub max_distance_meters: u32,
}

impl AnimalFilters {
    /// Attribute match only; distance is handled by the regional query.
    #[must_use]
    pub fn matches(&self, animal: &AdoptableAnimal) -> bool {
        if let Some(gender) = self.gender
            && animal.gender != gender
        {
            return false;
        }
        if let Some(neutered) = self.neutered
            && animal.neutered != neutered
        {
            return false;
        }
        animal.age_in_weeks >= self.min_age_weeks && animal.age_in_weeks <= self.max_age_weeks
    }
}

/// How trustworthy the query coordinates are, which picks the geohash cell
/// size used for the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatePrecision {
    /// Device-precise or caller-supplied coordinates.
    Precise,
    /// Derived from IP geolocation; coarser cells raise the hit rate.
    IpDerived,
}

impl CoordinatePrecision {
    #[must_use]
    pub const fn geohash_len(self) -> usize {
        match self {
            Self::Precise => PRECISION_PRECISE,
            Self::IpDerived => PRECISION_IP_DERIVED,
        }
    }
}

/// One page of filtered results plus the filtered total for pagination.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub animals: Vec<AdoptableAnimal>,
    pub total_results: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid search data: {0}")]
    Validation(String),

    #[error("dependency failure: {0}")]
    Dependency(String),
}

/// Snaps a requested radius up to the first fixed bucket that covers it,
/// clamping to the largest bucket. Fixed radii keep the regional cache key
/// space small.
#[must_use]
pub fn snap_distance_bucket(meters: u32) -> u32 {
    for bucket in DISTANCE_BUCKETS_METERS {
        if meters <= *bucket {
            return *bucket;
        }
    }
    // Above the top bucket: clamp.
    *DISTANCE_BUCKETS_METERS
        .last()
        .unwrap_or(&meters)
}

#[async_trait::async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Finds adoptable animals near the filter coordinates.
    ///
    /// Serves from the regional cache when possible; attribute filters and
    /// pagination apply after retrieval so differently-filtered searches in
    /// the same region share one cache entry.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::Validation`] when rows fail the canonical shape
    ///   contract
    /// - [`DiscoveryError::Dependency`] on store or cache transport failures
    async fn search(
        &self,
        filters: &AnimalFilters,
        precision: CoordinatePrecision,
        page: u64,
        page_size: u64,
    ) -> Result<SearchPage, DiscoveryError>;
}
