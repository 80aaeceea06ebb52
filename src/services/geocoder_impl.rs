//! Caching [`Geocoder`] backed by an external IP geolocation provider.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::cache::Cache;
use crate::constants::cache::{IP_COORDS_KEY_PREFIX, IP_COORDS_TTL_SECONDS};
use crate::services::geocoder::{Geocoder, IpCoordinates, IpLocationProvider, is_public_ipv4};

pub struct CachedGeocoder {
    provider: Arc<dyn IpLocationProvider>,
    cache: Arc<dyn Cache>,
}

impl CachedGeocoder {
    #[must_use]
    pub fn new(provider: Arc<dyn IpLocationProvider>, cache: Arc<dyn Cache>) -> Self {
        Self { provider, cache }
    }

    fn cache_key(ip: &str) -> String {
        format!("{IP_COORDS_KEY_PREFIX}:{ip}")
    }

    /// Returns a cached value when it parses and validates. A payload that
    /// fails either check is evicted so the provider call below overwrites
    /// the stale key.
    async fn cached_coordinates(&self, key: &str, ip: &str) -> Option<IpCoordinates> {
        let payload = match self.cache.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!("coordinate cache read for {ip} failed, treating as miss: {e:#}");
                return None;
            }
        };

        match serde_json::from_str::<IpCoordinates>(&payload) {
            Ok(coords) if coords.is_valid() => return Some(coords),
            Ok(_) => warn!("cached coordinates for {ip} out of range, discarding"),
            Err(e) => warn!("cached coordinates for {ip} malformed, discarding: {e}"),
        }
        if let Err(e) = self.cache.del(key).await {
            warn!("failed to evict stale coordinate cache entry for {ip}: {e:#}");
        }
        None
    }
}

#[async_trait::async_trait]
impl Geocoder for CachedGeocoder {
    async fn resolve(&self, ip: &str) -> Option<IpCoordinates> {
        if !is_public_ipv4(ip) {
            debug!("skipping geolocation for non-public address {ip}");
            return None;
        }

        let key = Self::cache_key(ip);
        if let Some(coords) = self.cached_coordinates(&key, ip).await {
            return Some(coords);
        }

        let location = match self.provider.locate(ip).await {
            Ok(location) => location,
            Err(e) => {
                error!("error fetching coordinates for IP address {ip}: {e:#}");
                return None;
            }
        };

        let coords = IpCoordinates {
            city: location.city,
            latitude: location.latitude,
            longitude: location.longitude,
        };
        if !coords.is_valid() {
            error!("provider returned invalid coordinates for IP address {ip}");
            return None;
        }

        let json = match serde_json::to_string(&coords) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize coordinates for {ip}: {e}");
                return None;
            }
        };
        if let Err(e) = self.cache.set(&key, &json, IP_COORDS_TTL_SECONDS).await {
            error!("failed to cache coordinates for IP address {ip}: {e:#}");
            return None;
        }

        Some(coords)
    }
}
