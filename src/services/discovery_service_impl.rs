//! Cache-accelerated implementation of [`DiscoveryService`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::Cache;
use crate::constants::cache::{REGION_KEY_PREFIX, REGION_TTL_SECONDS};
use crate::db::AnimalStore;
use crate::models::AdoptableAnimal;
use crate::services::discovery_service::{
    AnimalFilters, CoordinatePrecision, DiscoveryError, DiscoveryService, SearchPage,
    snap_distance_bucket,
};

pub struct CachedDiscoveryService {
    store: Arc<dyn AnimalStore>,
    cache: Arc<dyn Cache>,
}

impl CachedDiscoveryService {
    #[must_use]
    pub fn new(store: Arc<dyn AnimalStore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    /// Reads the regional set for `key`, discarding and evicting any payload
    /// that fails to parse or validate so the miss path can self-heal it.
    async fn cached_region(&self, key: &str) -> Result<Option<Vec<AdoptableAnimal>>, DiscoveryError> {
        let payload = match self
            .cache
            .get(key)
            .await
            .map_err(|e| DiscoveryError::Dependency(format!("cache read failed: {e:#}")))?
        {
            Some(payload) => payload,
            None => return Ok(None),
        };

        match serde_json::from_str::<Vec<AdoptableAnimal>>(&payload) {
            Ok(animals) if animals.iter().all(|a| a.validate().is_ok()) => {
                return Ok(Some(animals));
            }
            Ok(_) => warn!("cached regional set under {key} failed validation, discarding"),
            Err(e) => warn!("cached regional set under {key} malformed, discarding: {e}"),
        }
        if let Err(e) = self.cache.del(key).await {
            warn!("failed to evict stale regional cache entry {key}: {e:#}");
        }
        Ok(None)
    }

    fn validate_rows(animals: &[AdoptableAnimal]) -> Result<(), DiscoveryError> {
        for animal in animals {
            animal.validate().map_err(DiscoveryError::Validation)?;
        }
        Ok(())
    }

    fn paginate(
        mut matched: Vec<AdoptableAnimal>,
        page: u64,
        page_size: u64,
    ) -> SearchPage {
        let total_results = matched.len() as u64;
        let offset = (page.saturating_sub(1)).saturating_mul(page_size);
        let animals: Vec<AdoptableAnimal> = if offset >= total_results {
            Vec::new()
        } else {
            matched
                .drain(..)
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(page_size).unwrap_or(usize::MAX))
                .collect()
        };
        SearchPage {
            animals,
            total_results,
            page,
            page_size,
        }
    }
}

#[async_trait::async_trait]
impl DiscoveryService for CachedDiscoveryService {
    async fn search(
        &self,
        filters: &AnimalFilters,
        precision: CoordinatePrecision,
        page: u64,
        page_size: u64,
    ) -> Result<SearchPage, DiscoveryError> {
        let bucket = snap_distance_bucket(filters.max_distance_meters);
        let cell = geohash::encode(
            geohash::Coord {
                x: filters.longitude,
                y: filters.latitude,
            },
            precision.geohash_len(),
        )
        .map_err(|e| DiscoveryError::Validation(format!("ungeohashable coordinates: {e}")))?;
        let key = format!("{REGION_KEY_PREFIX}:{cell}:{bucket}");

        if let Some(animals) = self.cached_region(&key).await? {
            debug!("regional cache hit for {key} ({} animals)", animals.len());
            let matched = animals.into_iter().filter(|a| filters.matches(a)).collect();
            return Ok(Self::paginate(matched, page, page_size));
        }

        let animals = self
            .store
            .animals_within_radius(filters.latitude, filters.longitude, bucket)
            .await
            .map_err(|e| DiscoveryError::Dependency(format!("regional query failed: {e:#}")))?;
        Self::validate_rows(&animals)?;

        // Cache the entire unfiltered set so other filter permutations over
        // this region hit the same entry.
        let json = serde_json::to_string(&animals)
            .map_err(|e| DiscoveryError::Dependency(format!("serialize failed: {e}")))?;
        self.cache
            .set(&key, &json, REGION_TTL_SECONDS)
            .await
            .map_err(|e| DiscoveryError::Dependency(format!("cache write failed: {e:#}")))?;
        debug!("cached regional set for {key} ({} animals)", animals.len());

        let matched = animals.into_iter().filter(|a| filters.matches(a)).collect();
        Ok(Self::paginate(matched, page, page_size))
    }
}
