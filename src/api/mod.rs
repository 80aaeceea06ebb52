//! HTTP surface: router, shared state and wiring of the concrete clients.

pub mod animals;
pub mod error;
pub mod types;
pub mod validation;

pub use error::ApiError;
pub use types::ApiResponse;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::clients::geoapify::GeoapifyClient;
use crate::clients::storage::SupabaseStorage;
use crate::clients::upstash::UpstashCache;
use crate::config::Config;
use crate::constants::photos::{MAX_FILE_SIZE_BYTES, MAX_PHOTOS_PER_ANIMAL};
use crate::db::{AnimalStore, Store};
use crate::services::{
    CachedDiscoveryService, CachedGeocoder, DiscoveryService, Geocoder, ListingService,
    PhotoService, SagaPhotoService, StoreListingService,
};

/// Handler dependencies behind their service seams, so router tests can run
/// against in-memory substitutes.
#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<dyn DiscoveryService>,
    pub photos: Arc<dyn PhotoService>,
    pub listings: Arc<dyn ListingService>,
    pub geocoder: Arc<dyn Geocoder>,
    pub store: Arc<dyn AnimalStore>,
    pub start_time: Instant,
}

/// Connects the database and builds the production service graph.
pub async fn create_app_state(config: &Config) -> anyhow::Result<AppState> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let store: Arc<dyn AnimalStore> = Arc::new(
        Store::with_pool_options(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?,
    );
    let cache = Arc::new(UpstashCache::new(
        http.clone(),
        &config.cache.url,
        &config.cache.token,
    ));
    let blobs = Arc::new(SupabaseStorage::new(
        http.clone(),
        &config.storage.url,
        &config.storage.api_key,
        &config.storage.bucket,
    ));
    let provider = Arc::new(GeoapifyClient::new(
        http,
        &config.geoapify.base_url,
        &config.geoapify.ipinfo_path,
        &config.geoapify.api_key,
    ));

    Ok(AppState {
        discovery: Arc::new(CachedDiscoveryService::new(store.clone(), cache.clone())),
        photos: Arc::new(SagaPhotoService::new(store.clone(), blobs.clone())),
        listings: Arc::new(StoreListingService::new(store.clone(), blobs)),
        geocoder: Arc::new(CachedGeocoder::new(provider, cache)),
        store,
        start_time: Instant::now(),
    })
}

pub fn router(state: AppState) -> Router {
    // Five photos plus the JSON part and multipart framing.
    let upload_limit = MAX_PHOTOS_PER_ANIMAL * MAX_FILE_SIZE_BYTES + 64 * 1024;

    Router::new()
        .route("/api/health", get(animals::health))
        .route(
            "/api/adoptable-animals/search",
            post(animals::search_adoptable),
        )
        .route(
            "/api/adoptable-animals/{animal_id}",
            get(animals::get_adoptable),
        )
        .route(
            "/api/animals",
            post(animals::create_animal).get(animals::list_listings),
        )
        .route(
            "/api/animals/{animal_id}",
            get(animals::get_listing)
                .patch(animals::update_animal)
                .delete(animals::delete_animal),
        )
        .route(
            "/api/animals/{animal_id}/photos",
            put(animals::replace_photos),
        )
        .route(
            "/api/rehomer/animals",
            axum::routing::delete(animals::delete_animals_for_rehomer),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
