use serde::{Deserialize, Serialize};

use crate::domain::{AnimalId, Gender, RehomerId};
use crate::models::{AdoptableAnimal, Animal, AnimalPhoto, Coordinates};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDto {
    pub photo_url: String,
    pub order: i32,
}

impl From<AnimalPhoto> for PhotoDto {
    fn from(photo: AnimalPhoto) -> Self {
        Self {
            photo_url: photo.url,
            order: photo.order,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptableAnimalDto {
    pub animal_id: AnimalId,
    pub name: String,
    pub gender: Gender,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_latitude: f64,
    pub address_longitude: f64,
    pub distance_meters: f64,
    pub animal_photos: Vec<PhotoDto>,
}

impl From<AdoptableAnimal> for AdoptableAnimalDto {
    fn from(animal: AdoptableAnimal) -> Self {
        Self {
            animal_id: animal.animal_id,
            name: animal.name,
            gender: animal.gender,
            age_in_weeks: animal.age_in_weeks,
            neutered: animal.neutered,
            description: animal.description,
            address_latitude: animal.address_latitude,
            address_longitude: animal.address_longitude,
            distance_meters: animal.distance_meters,
            animal_photos: animal.photos.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDto {
    pub animal_id: AnimalId,
    pub name: String,
    pub gender: Gender,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_display_name: String,
    pub rehomer_id: RehomerId,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: String,
    pub last_updated_at: String,
    pub animal_photos: Vec<PhotoDto>,
}

impl From<Animal> for ListingDto {
    fn from(animal: Animal) -> Self {
        Self {
            animal_id: animal.id,
            name: animal.name,
            gender: animal.gender,
            age_in_weeks: animal.age_in_weeks,
            neutered: animal.neutered,
            description: animal.description,
            address_display_name: animal.address_display_name,
            rehomer_id: animal.rehomer_id,
            latitude: animal.location.latitude,
            longitude: animal.location.longitude,
            created_at: animal.created_at.to_rfc3339(),
            last_updated_at: animal.last_updated_at.to_rfc3339(),
            animal_photos: animal.photos.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub total_results: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl PaginationDto {
    #[must_use]
    pub fn new(total_results: u64, page: u64, page_size: u64) -> Self {
        Self {
            total_results,
            page,
            page_size,
            total_pages: total_results.div_ceil(page_size.max(1)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponseDto {
    pub animals: Vec<AdoptableAnimalDto>,
    pub location_display: Option<String>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsResponseDto {
    pub animals: Vec<ListingDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDto {
    pub animal_id: AnimalId,
}

/// Where the search coordinates came from, which also decides the geohash
/// precision used for the regional cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LocationSource {
    #[serde(rename = "client-ip")]
    ClientIp,
    #[serde(rename = "client-current-location")]
    ClientCurrentLocation,
    #[serde(rename = "client-custom-location")]
    ClientCustomLocation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub location_source: LocationSource,
    pub gender: Option<String>,
    pub neutered: Option<bool>,
    pub min_age_weeks: Option<i32>,
    pub max_age_weeks: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_distance_km: Option<u32>,
    /// Display name for custom locations, echoed back to the client.
    pub location_details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnimalRequest {
    pub name: String,
    pub gender: String,
    pub age_in_weeks: i32,
    pub neutered: bool,
    pub description: String,
    pub address_display_name: String,
    pub address: CoordinatesRequest,
}

#[derive(Debug, Deserialize)]
pub struct CoordinatesRequest {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CoordinatesRequest> for Coordinates {
    fn from(req: CoordinatesRequest) -> Self {
        Self {
            latitude: req.latitude,
            longitude: req.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnimalRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age_in_weeks: Option<i32>,
    pub neutered: Option<bool>,
    pub description: Option<String>,
    pub address_display_name: Option<String>,
    pub address: Option<CoordinatesRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: &'static str,
    pub uptime_seconds: u64,
}
