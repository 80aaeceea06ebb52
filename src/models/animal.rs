//! Animal listing models and the regional search row contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AnimalId, Gender, RehomerId};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A single gallery photo. `order` is a 0-based position within the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalPhoto {
    pub url: String,
    pub order: i32,
}

/// A rehomer-owned animal listing as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub name: String,
    pub gender: Gender,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_display_name: String,
    pub rehomer_id: RehomerId,
    pub location: Coordinates,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub photos: Vec<AnimalPhoto>,
}

/// Fields required to create a listing.
#[derive(Debug, Clone)]
pub struct NewAnimal {
    pub name: String,
    pub gender: Gender,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_display_name: String,
    pub location: Coordinates,
}

/// Explicit partial update for a listing. Only fields carrying `Some` are
/// written, which keeps a sparse PATCH body from overwriting the whole row.
#[derive(Debug, Clone, Default)]
pub struct AnimalPatch {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age_in_weeks: Option<i32>,
    pub neutered: Option<bool>,
    pub description: Option<String>,
    pub address_display_name: Option<String>,
    pub location: Option<Coordinates>,
}

impl AnimalPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.age_in_weeks.is_none()
            && self.neutered.is_none()
            && self.description.is_none()
            && self.address_display_name.is_none()
            && self.location.is_none()
    }
}

/// One row of a regional search result, in the canonical field contract the
/// store produces and the region cache persists. Kept unfiltered and sorted
/// by `distance_meters` ascending so one cache entry serves every
/// attribute-filter permutation over the same area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoptableAnimal {
    pub animal_id: AnimalId,
    pub name: String,
    pub gender: Gender,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_latitude: f64,
    pub address_longitude: f64,
    pub rehomer_id: RehomerId,
    pub distance_meters: f64,
    pub photos: Vec<AnimalPhoto>,
}

impl AdoptableAnimal {
    /// Checks the row against the canonical contract. Applied both to rows
    /// coming back from the store and to payloads read from the region
    /// cache; a failing cached payload is evicted and refetched.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err(format!("animal {}: empty name", self.animal_id));
        }
        if self.description.is_empty() {
            return Err(format!("animal {}: empty description", self.animal_id));
        }
        if self.age_in_weeks < 0 {
            return Err(format!("animal {}: negative age", self.animal_id));
        }
        if !(-90.0..=90.0).contains(&self.address_latitude) {
            return Err(format!("animal {}: latitude out of range", self.animal_id));
        }
        if !(-180.0..=180.0).contains(&self.address_longitude) {
            return Err(format!("animal {}: longitude out of range", self.animal_id));
        }
        if self.photos.iter().any(|p| p.order < 0 || p.url.is_empty()) {
            return Err(format!("animal {}: malformed photo entry", self.animal_id));
        }
        Ok(())
    }
}
