//! Caching and degradation behavior of the IP geocoder.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{FakeCache, FakeLocationProvider};
use homeward::services::{CachedGeocoder, Geocoder};

fn geocoder(provider: &Arc<FakeLocationProvider>, cache: &Arc<FakeCache>) -> CachedGeocoder {
    CachedGeocoder::new(provider.clone(), cache.clone())
}

#[tokio::test]
async fn resolution_caches_and_reuses_coordinates() {
    let provider = Arc::new(FakeLocationProvider::returning("Bristol", 51.45, -2.59));
    let cache = Arc::new(FakeCache::new());
    let geo = geocoder(&provider, &cache);

    let first = geo.resolve("8.8.8.8").await.unwrap();
    assert_eq!(first.city, "Bristol");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.keys(), vec!["coordsForIP:8.8.8.8".to_string()]);

    let second = geo.resolve("8.8.8.8").await.unwrap();
    assert_eq!(second, first);
    // Served from cache, not the provider.
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_public_addresses_never_reach_the_provider() {
    let provider = Arc::new(FakeLocationProvider::returning("Bristol", 51.45, -2.59));
    let cache = Arc::new(FakeCache::new());
    let geo = geocoder(&provider, &cache);

    for ip in ["10.0.0.1", "192.168.1.1", "127.0.0.1", "::1", "junk"] {
        assert!(geo.resolve(ip).await.is_none());
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert!(cache.keys().is_empty());
}

#[tokio::test]
async fn provider_failure_degrades_to_none() {
    let provider = Arc::new(FakeLocationProvider::failing());
    let cache = Arc::new(FakeCache::new());
    let geo = geocoder(&provider, &cache);

    assert!(geo.resolve("8.8.8.8").await.is_none());
    assert!(cache.keys().is_empty());
}

#[tokio::test]
async fn cache_write_failure_degrades_to_none() {
    let provider = Arc::new(FakeLocationProvider::returning("Bristol", 51.45, -2.59));
    let cache = Arc::new(FakeCache::new());
    cache.fail_set.store(true, Ordering::SeqCst);
    let geo = geocoder(&provider, &cache);

    assert!(geo.resolve("8.8.8.8").await.is_none());
}

#[tokio::test]
async fn invalid_provider_coordinates_are_rejected() {
    let provider = Arc::new(FakeLocationProvider::returning("Nowhere", 120.0, 0.0));
    let cache = Arc::new(FakeCache::new());
    let geo = geocoder(&provider, &cache);

    assert!(geo.resolve("8.8.8.8").await.is_none());
    assert!(cache.keys().is_empty());
}

#[tokio::test]
async fn malformed_cached_payload_is_evicted_and_refetched() {
    let provider = Arc::new(FakeLocationProvider::returning("Bristol", 51.45, -2.59));
    let cache = Arc::new(FakeCache::new());
    cache.put("coordsForIP:8.8.8.8", "{not json");
    let geo = geocoder(&provider, &cache);

    let coords = geo.resolve("8.8.8.8").await.unwrap();
    assert_eq!(coords.city, "Bristol");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.dels.load(Ordering::SeqCst), 1);
}
