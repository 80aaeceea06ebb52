//! HTTP handlers for discovery, listings and photo galleries.

use axum::{
    Json,
    extract::{ConnectInfo, Multipart, Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::debug;

use super::AppState;
use super::error::ApiError;
use super::types::{
    AdoptableAnimalDto, ApiResponse, CreatedDto, HealthDto, ListingDto, ListingsResponseDto,
    LocationSource, NewAnimalRequest, PaginationDto, SearchRequest, SearchResponseDto,
    UpdateAnimalRequest,
};
use super::validation::{
    clamp_pagination, client_ip, extract_rehomer_id, validate_animal_patch, validate_new_animal,
    validate_photo_files, validate_provided_coordinates, validate_resulting_gallery_size,
    validate_search_request,
};
use crate::domain::AnimalId;
use crate::models::Coordinates;
use crate::services::{CoordinatePrecision, PhotoUpload};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<ApiResponse<HealthDto>>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::DatabaseError(format!("health check failed: {e:#}")))?;
    Ok(Json(ApiResponse::success(HealthDto {
        status: "ok",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}

/// POST /api/adoptable-animals/search
///
/// Resolves the search origin from the declared location source, then runs
/// the cached regional search.
pub async fn search_adoptable(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(paging): Query<PageQuery>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<ApiResponse<SearchResponseDto>>, ApiError> {
    let mut filters = validate_search_request(&req)?;

    let (origin, precision, location_display) = match req.location_source {
        LocationSource::ClientIp => {
            let ip = client_ip(&headers, peer);
            debug!("resolving search origin from ip {ip}");
            let resolved = state.geocoder.resolve(&ip).await.ok_or_else(|| {
                ApiError::LocationUnavailable(
                    "Could not determine a search area from your network address".to_string(),
                )
            })?;
            (
                Coordinates {
                    latitude: resolved.latitude,
                    longitude: resolved.longitude,
                },
                CoordinatePrecision::IpDerived,
                Some(resolved.city),
            )
        }
        LocationSource::ClientCurrentLocation => (
            validate_provided_coordinates(req.latitude, req.longitude)?,
            CoordinatePrecision::Precise,
            None,
        ),
        LocationSource::ClientCustomLocation => (
            validate_provided_coordinates(req.latitude, req.longitude)?,
            CoordinatePrecision::Precise,
            req.location_details.clone(),
        ),
    };
    filters.latitude = origin.latitude;
    filters.longitude = origin.longitude;

    let (page, page_size) = clamp_pagination(paging.page, paging.page_size);
    let result = state
        .discovery
        .search(&filters, precision, page, page_size)
        .await?;

    Ok(Json(ApiResponse::success(SearchResponseDto {
        animals: result.animals.into_iter().map(Into::into).collect(),
        location_display,
        pagination: PaginationDto::new(result.total_results, result.page, result.page_size),
    })))
}

/// GET /api/adoptable-animals/{animal_id} — public adoptable detail.
pub async fn get_adoptable(
    State(state): State<AppState>,
    Path(animal_id): Path<AnimalId>,
) -> Result<Json<ApiResponse<AdoptableAnimalDto>>, ApiError> {
    let animal = state.listings.get_adoptable(animal_id).await?;
    Ok(Json(ApiResponse::success(animal.into())))
}

struct ParsedUploadForm {
    json_parts: std::collections::HashMap<String, Vec<u8>>,
    files: Vec<PhotoUpload>,
}

/// Splits a multipart body into named JSON parts and file parts. File parts
/// are any field carrying a file name.
async fn parse_upload_form(mut multipart: Multipart) -> Result<ParsedUploadForm, ApiError> {
    let mut json_parts = std::collections::HashMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name() {
            let file_name = file_name.to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("failed to read file part: {e}")))?;
            files.push(PhotoUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("failed to read form part: {e}")))?;
            json_parts.insert(name, bytes.to_vec());
        }
    }

    Ok(ParsedUploadForm { json_parts, files })
}

fn required_json_part<T: serde::de::DeserializeOwned>(
    form: &ParsedUploadForm,
    name: &str,
) -> Result<T, ApiError> {
    let bytes = form
        .json_parts
        .get(name)
        .ok_or_else(|| ApiError::validation(format!("missing '{name}' part")))?;
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::validation(format!("malformed '{name}' part: {e}")))
}

/// POST /api/animals
///
/// Multipart: an `animal` JSON part plus up to five photo files. The listing
/// row and its photos are created together; a photo failure rolls the whole
/// creation back.
pub async fn create_animal(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ApiResponse<CreatedDto>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    let form = parse_upload_form(multipart).await?;

    let request: NewAnimalRequest = required_json_part(&form, "animal")?;
    let animal = validate_new_animal(request)?;
    if form.files.is_empty() {
        return Err(ApiError::validation("At least one photo is required"));
    }
    validate_photo_files(&form.files)?;

    let animal_id = state.listings.add_animal(rehomer_id, animal).await?;
    state
        .photos
        .add_photos(rehomer_id, animal_id, form.files)
        .await?;

    Ok(Json(ApiResponse::success(CreatedDto { animal_id })))
}

/// GET /api/animals
pub async fn list_listings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(paging): Query<PageQuery>,
) -> Result<Json<ApiResponse<ListingsResponseDto>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    let (page, page_size) = clamp_pagination(paging.page, paging.page_size);
    let (animals, total) = state.listings.list_listings(rehomer_id, page, page_size).await?;
    Ok(Json(ApiResponse::success(ListingsResponseDto {
        animals: animals.into_iter().map(Into::into).collect(),
        pagination: PaginationDto::new(total, page, page_size),
    })))
}

/// GET /api/animals/{animal_id}
pub async fn get_listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(animal_id): Path<AnimalId>,
) -> Result<Json<ApiResponse<ListingDto>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    let animal = state.listings.get_listing(rehomer_id, animal_id).await?;
    Ok(Json(ApiResponse::success(animal.into())))
}

/// PATCH /api/animals/{animal_id}
pub async fn update_animal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(animal_id): Path<AnimalId>,
    Json(req): Json<UpdateAnimalRequest>,
) -> Result<Json<ApiResponse<ListingDto>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    let patch = validate_animal_patch(req)?;
    state.listings.update_animal(rehomer_id, animal_id, patch).await?;
    let animal = state.listings.get_listing(rehomer_id, animal_id).await?;
    Ok(Json(ApiResponse::success(animal.into())))
}

/// DELETE /api/animals/{animal_id}
pub async fn delete_animal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(animal_id): Path<AnimalId>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    state.listings.delete_animal(rehomer_id, animal_id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// DELETE /api/rehomer/animals — account-cleanup sweep.
pub async fn delete_animals_for_rehomer(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    state.listings.delete_animals_for_rehomer(rehomer_id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// PUT /api/animals/{animal_id}/photos
///
/// Multipart: a `deletePhotoUrls` JSON array part (may be empty) plus new
/// photo files. The resulting gallery must stay within the photo cap.
pub async fn replace_photos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(animal_id): Path<AnimalId>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ListingDto>>, ApiError> {
    let rehomer_id = extract_rehomer_id(&headers)?;
    let form = parse_upload_form(multipart).await?;

    let delete_urls: Vec<String> = if form.json_parts.contains_key("deletePhotoUrls") {
        required_json_part(&form, "deletePhotoUrls")?
    } else {
        Vec::new()
    };
    if delete_urls.is_empty() && form.files.is_empty() {
        return Err(ApiError::validation(
            "Provide photos to add, photo URLs to delete, or both",
        ));
    }
    validate_photo_files(&form.files)?;

    let existing = state
        .store
        .count_photos(animal_id)
        .await
        .map_err(|e| ApiError::DatabaseError(format!("failed to count photos: {e:#}")))?;
    validate_resulting_gallery_size(
        usize::try_from(existing).unwrap_or(usize::MAX),
        delete_urls.len(),
        form.files.len(),
    )?;

    state
        .photos
        .replace_photos(rehomer_id, animal_id, form.files, delete_urls)
        .await?;

    let animal = state.listings.get_listing(rehomer_id, animal_id).await?;
    Ok(Json(ApiResponse::success(animal.into())))
}
