//! Request-shape checks done before any service runs. The 5-photo cap lives
//! here, not in the saga.

use axum::http::HeaderMap;
use std::net::SocketAddr;
use std::str::FromStr;

use super::ApiError;
use super::types::{NewAnimalRequest, SearchRequest, UpdateAnimalRequest};
use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_AGE_WEEKS, MAX_PAGE_SIZE};
use crate::constants::photos::{ALLOWED_FILE_TYPES, MAX_FILE_SIZE_BYTES, MAX_PHOTOS_PER_ANIMAL};
use crate::domain::{Gender, RehomerId};
use crate::models::{AnimalPatch, Coordinates, NewAnimal};
use crate::services::{AnimalFilters, PhotoUpload};

const MAX_DISTANCE_KM: u32 = 250;

/// Caller identity, verified upstream by the auth gateway and forwarded in
/// a header. Token issuance and verification are not this service's job.
pub fn extract_rehomer_id(headers: &HeaderMap) -> Result<RehomerId, ApiError> {
    let value = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing user identity".to_string()))?;
    RehomerId::from_str(value)
        .map_err(|_| ApiError::Unauthorized("Malformed user identity".to_string()))
}

/// First hop of X-Forwarded-For when present, else the socket peer.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// Clamps pagination to sane bounds rather than rejecting.
#[must_use]
pub fn clamp_pagination(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

fn parse_gender(value: &str) -> Result<Gender, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation("Invalid gender. 'Male' or 'Female' accepted."))
}

fn check_age(age: i32) -> Result<i32, ApiError> {
    if !(0..=MAX_AGE_WEEKS).contains(&age) {
        return Err(ApiError::validation(format!(
            "Age must be between 0 and {MAX_AGE_WEEKS} weeks"
        )));
    }
    Ok(age)
}

fn check_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates, ApiError> {
    let coords = Coordinates {
        latitude,
        longitude,
    };
    if !coords.in_range() {
        return Err(ApiError::validation(
            "Latitude must be within [-90, 90] and longitude within [-180, 180]",
        ));
    }
    Ok(coords)
}

/// Builds the attribute half of the search filters. Coordinates are filled
/// in by the handler once the location source is resolved.
pub fn validate_search_request(req: &SearchRequest) -> Result<AnimalFilters, ApiError> {
    let gender = req.gender.as_deref().map(parse_gender).transpose()?;
    let min_age_weeks = check_age(req.min_age_weeks.unwrap_or(0))?;
    let max_age_weeks = check_age(req.max_age_weeks.unwrap_or(MAX_AGE_WEEKS))?;
    if min_age_weeks > max_age_weeks {
        return Err(ApiError::validation("Minimum age exceeds maximum age"));
    }

    let distance_km = req.max_distance_km.unwrap_or(MAX_DISTANCE_KM);
    if !(1..=MAX_DISTANCE_KM).contains(&distance_km) {
        return Err(ApiError::validation("Invalid maximum distance"));
    }

    Ok(AnimalFilters {
        gender,
        neutered: req.neutered,
        min_age_weeks,
        max_age_weeks,
        latitude: 0.0,
        longitude: 0.0,
        max_distance_meters: distance_km * 1000,
    })
}

pub fn validate_provided_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinates, ApiError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => check_coordinates(lat, lon),
        _ => Err(ApiError::validation(
            "Latitude and longitude are required for this location source",
        )),
    }
}

pub fn validate_new_animal(req: NewAnimalRequest) -> Result<NewAnimal, ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::validation("Name must not be empty"));
    }
    if req.description.is_empty() {
        return Err(ApiError::validation("Description must not be empty"));
    }
    if req.address_display_name.is_empty() {
        return Err(ApiError::validation("Address display name must not be empty"));
    }
    let gender = parse_gender(&req.gender)?;
    let age_in_weeks = check_age(req.age_in_weeks)?;
    let location = check_coordinates(req.address.latitude, req.address.longitude)?;

    Ok(NewAnimal {
        name: req.name,
        gender,
        age_in_weeks,
        neutered: req.neutered,
        description: req.description,
        address_display_name: req.address_display_name,
        location,
    })
}

pub fn validate_animal_patch(req: UpdateAnimalRequest) -> Result<AnimalPatch, ApiError> {
    if let Some(name) = &req.name
        && name.is_empty()
    {
        return Err(ApiError::validation("Name must not be empty"));
    }
    if let Some(description) = &req.description
        && description.is_empty()
    {
        return Err(ApiError::validation("Description must not be empty"));
    }
    let gender = req.gender.as_deref().map(parse_gender).transpose()?;
    let age_in_weeks = req.age_in_weeks.map(check_age).transpose()?;
    let location = req
        .address
        .map(|a| check_coordinates(a.latitude, a.longitude))
        .transpose()?;

    Ok(AnimalPatch {
        name: req.name,
        gender,
        age_in_weeks,
        neutered: req.neutered,
        description: req.description,
        address_display_name: req.address_display_name,
        location,
    })
}

/// Per-file and per-request upload checks.
pub fn validate_photo_files(files: &[PhotoUpload]) -> Result<(), ApiError> {
    if files.len() > MAX_PHOTOS_PER_ANIMAL {
        return Err(ApiError::validation(format!(
            "Maximum {MAX_PHOTOS_PER_ANIMAL} photos allowed"
        )));
    }
    for file in files {
        if file.bytes.len() > MAX_FILE_SIZE_BYTES {
            return Err(ApiError::validation(format!(
                "File {} exceeds the {MAX_FILE_SIZE_BYTES} byte limit",
                file.file_name
            )));
        }
        if !ALLOWED_FILE_TYPES
            .iter()
            .any(|(ct, _)| *ct == file.content_type)
        {
            return Err(ApiError::validation(format!(
                "File {} has unsupported content type {}",
                file.file_name, file.content_type
            )));
        }
    }
    Ok(())
}

/// The gallery resulting from a replace call must stay within the cap. The
/// saga itself never re-checks this.
pub fn validate_resulting_gallery_size(
    existing: usize,
    deleting: usize,
    adding: usize,
) -> Result<(), ApiError> {
    let resulting = existing.saturating_sub(deleting) + adding;
    if resulting > MAX_PHOTOS_PER_ANIMAL {
        return Err(ApiError::validation(format!(
            "Gallery would hold {resulting} photos; maximum {MAX_PHOTOS_PER_ANIMAL} allowed"
        )));
    }
    Ok(())
}
