//! Fixed values shared across the discovery and photo subsystems.

/// Fixed search radii in meters. Snapping requested distances onto these
/// buckets keeps the regional cache key space small and reusable.
pub const DISTANCE_BUCKETS_METERS: &[u32] = &[
    1000, 3000, 5000, 10_000, 20_000, 35_000, 50_000, 75_000, 100_000, 150_000, 250_000,
];

pub mod cache {

    /// TTL for a cached regional animal set.
    pub const REGION_TTL_SECONDS: u64 = 600;

    /// TTL for cached IP-derived coordinates.
    pub const IP_COORDS_TTL_SECONDS: u64 = 86_400;

    pub const REGION_KEY_PREFIX: &str = "animalsForGeohash";

    pub const IP_COORDS_KEY_PREFIX: &str = "coordsForIP";
}

pub mod geohash {

    /// Precision for caller-supplied, device-accurate coordinates.
    pub const PRECISION_PRECISE: usize = 6;

    /// Coarser precision for IP-derived coordinates; trades locality
    /// accuracy for cache hit rate.
    pub const PRECISION_IP_DERIVED: usize = 5;
}

pub mod photos {

    pub const MAX_PHOTOS_PER_ANIMAL: usize = 5;

    pub const MAX_FILE_SIZE_BYTES: usize = 1024 * 1024;

    /// Accepted upload content types and the file extension stored for each.
    pub const ALLOWED_FILE_TYPES: &[(&str, &str)] =
        &[("image/jpeg", "jpg"), ("image/png", "png"), ("image/webp", "webp")];

    pub const STORAGE_BUCKET: &str = "animals";
}

pub mod limits {

    pub const MAX_AGE_WEEKS: i32 = 1920;

    pub const MAX_PAGE_SIZE: u64 = 50;

    pub const DEFAULT_PAGE_SIZE: u64 = 10;
}
