//! Regional cache behavior of the discovery search.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{FakeCache, FakeStore, adoptable};
use homeward::domain::Gender;
use homeward::services::{
    AnimalFilters, CachedDiscoveryService, CoordinatePrecision, DiscoveryService,
};

fn filters() -> AnimalFilters {
    AnimalFilters {
        gender: None,
        neutered: None,
        min_age_weeks: 0,
        max_age_weeks: 1920,
        latitude: 51.45,
        longitude: -2.59,
        max_distance_meters: 5000,
    }
}

fn service(store: &Arc<FakeStore>, cache: &Arc<FakeCache>) -> CachedDiscoveryService {
    CachedDiscoveryService::new(store.clone(), cache.clone())
}

#[tokio::test]
async fn differently_filtered_searches_share_one_regional_entry() {
    let store = Arc::new(FakeStore::new());
    *store.regional.lock().unwrap() = vec![
        adoptable("Biscuit", Gender::Female, true, 30, 100.0),
        adoptable("Rex", Gender::Male, false, 52, 900.0),
        adoptable("Luna", Gender::Female, false, 10, 2500.0),
    ];
    let cache = Arc::new(FakeCache::new());
    let svc = service(&store, &cache);

    let all = svc
        .search(&filters(), CoordinatePrecision::Precise, 1, 10)
        .await
        .unwrap();
    assert_eq!(all.total_results, 3);
    assert_eq!(store.region_queries.load(Ordering::SeqCst), 1);

    // A second search over the same region with different attribute filters
    // must be answered from the cache.
    let females = svc
        .search(
            &AnimalFilters {
                gender: Some(Gender::Female),
                ..filters()
            },
            CoordinatePrecision::Precise,
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(females.total_results, 2);
    assert!(females.animals.iter().all(|a| a.gender == Gender::Female));
    assert_eq!(store.region_queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cached_entry_holds_the_full_unfiltered_set() {
    let store = Arc::new(FakeStore::new());
    *store.regional.lock().unwrap() = vec![
        adoptable("Biscuit", Gender::Female, true, 30, 100.0),
        adoptable("Rex", Gender::Male, false, 52, 900.0),
    ];
    let cache = Arc::new(FakeCache::new());
    let svc = service(&store, &cache);

    // Even a narrow search caches everything in the region.
    svc.search(
        &AnimalFilters {
            gender: Some(Gender::Male),
            ..filters()
        },
        CoordinatePrecision::Precise,
        1,
        10,
    )
    .await
    .unwrap();

    let keys = cache.keys();
    assert_eq!(keys.len(), 1);
    let payload = cache.entries.lock().unwrap().get(&keys[0]).cloned().unwrap();
    let cached: Vec<serde_json::Value> = serde_json::from_str(&payload).unwrap();
    assert_eq!(cached.len(), 2);
}

#[tokio::test]
async fn cache_key_snaps_distance_and_uses_the_precision_cell() {
    let store = Arc::new(FakeStore::new());
    let cache = Arc::new(FakeCache::new());
    let svc = service(&store, &cache);

    // 4 km snaps up to the 5 km bucket.
    svc.search(
        &AnimalFilters {
            max_distance_meters: 4000,
            ..filters()
        },
        CoordinatePrecision::Precise,
        1,
        10,
    )
    .await
    .unwrap();

    let keys = cache.keys();
    assert_eq!(keys.len(), 1);
    let parts: Vec<&str> = keys[0].split(':').collect();
    assert_eq!(parts[0], "animalsForGeohash");
    assert_eq!(parts[1].len(), 6);
    assert_eq!(parts[2], "5000");

    // IP-derived coordinates use a coarser 5-character cell.
    svc.search(
        &AnimalFilters {
            max_distance_meters: 4000,
            ..filters()
        },
        CoordinatePrecision::IpDerived,
        1,
        10,
    )
    .await
    .unwrap();
    let keys = cache.keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().any(|k| k.split(':').nth(1).unwrap().len() == 5));
}

#[tokio::test]
async fn malformed_cache_payload_is_evicted_and_refetched() {
    let store = Arc::new(FakeStore::new());
    *store.regional.lock().unwrap() = vec![adoptable("Biscuit", Gender::Female, true, 30, 100.0)];
    let cache = Arc::new(FakeCache::new());
    let svc = service(&store, &cache);

    // Prime the key, then corrupt it.
    svc.search(&filters(), CoordinatePrecision::Precise, 1, 10)
        .await
        .unwrap();
    let key = cache.keys().remove(0);
    cache.put(&key, "{not json");

    let result = svc
        .search(&filters(), CoordinatePrecision::Precise, 1, 10)
        .await
        .unwrap();
    assert_eq!(result.total_results, 1);
    assert_eq!(store.region_queries.load(Ordering::SeqCst), 2);
    assert_eq!(cache.dels.load(Ordering::SeqCst), 1);

    // The key was rewritten with a valid payload.
    let payload = cache.entries.lock().unwrap().get(&key).cloned().unwrap();
    assert!(serde_json::from_str::<Vec<serde_json::Value>>(&payload).is_ok());
}

#[tokio::test]
async fn cache_write_failure_fails_the_search() {
    let store = Arc::new(FakeStore::new());
    let cache = Arc::new(FakeCache::new());
    cache.fail_set.store(true, Ordering::SeqCst);
    let svc = service(&store, &cache);

    let result = svc
        .search(&filters(), CoordinatePrecision::Precise, 1, 10)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn pagination_slices_the_filtered_set() {
    let store = Arc::new(FakeStore::new());
    *store.regional.lock().unwrap() = (0..5)
        .map(|i| adoptable(&format!("A{i}"), Gender::Male, false, 10, f64::from(i) * 100.0))
        .collect();
    let cache = Arc::new(FakeCache::new());
    let svc = service(&store, &cache);

    let page = svc
        .search(&filters(), CoordinatePrecision::Precise, 2, 2)
        .await
        .unwrap();
    assert_eq!(page.total_results, 5);
    assert_eq!(page.animals.len(), 2);
    assert_eq!(page.animals[0].name, "A2");

    let past_end = svc
        .search(&filters(), CoordinatePrecision::Precise, 4, 2)
        .await
        .unwrap();
    assert!(past_end.animals.is_empty());
    assert_eq!(past_end.total_results, 5);
}
