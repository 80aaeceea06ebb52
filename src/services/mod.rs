pub mod compensation;

pub mod geocoder;
pub use geocoder::{Geocoder, IpCoordinates, IpLocation, IpLocationProvider, is_public_ipv4};

pub mod geocoder_impl;
pub use geocoder_impl::CachedGeocoder;

pub mod discovery_service;
pub use discovery_service::{
    AnimalFilters, CoordinatePrecision, DiscoveryError, DiscoveryService, SearchPage,
    snap_distance_bucket,
};

pub mod discovery_service_impl;
pub use discovery_service_impl::CachedDiscoveryService;

pub mod photo_service;
pub use photo_service::{PhotoError, PhotoService, PhotoUpload};

pub mod photo_service_impl;
pub use photo_service_impl::SagaPhotoService;

pub mod listing_service;
pub use listing_service::{ListingError, ListingService};

pub mod listing_service_impl;
pub use listing_service_impl::StoreListingService;
