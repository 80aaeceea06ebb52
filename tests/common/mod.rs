//! In-memory doubles for the store, blob storage, cache and the IP location
//! provider, with failure injection and call counting for saga and caching
//! tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use chrono::Utc;

use homeward::clients::storage::BlobStore;
use homeward::cache::Cache;
use homeward::db::AnimalStore;
use homeward::domain::{AnimalId, Gender, RehomerId};
use homeward::models::{AdoptableAnimal, Animal, AnimalPatch, AnimalPhoto, Coordinates, NewAnimal};
use homeward::services::{IpLocation, IpLocationProvider};

pub struct StoredAnimal {
    pub rehomer_id: RehomerId,
    pub data: NewAnimal,
}

#[derive(Default)]
pub struct FakeStore {
    pub animals: Mutex<HashMap<AnimalId, StoredAnimal>>,
    pub photos: Mutex<HashMap<AnimalId, Vec<AnimalPhoto>>>,
    /// Rows returned by every radius query, already sorted by distance.
    pub regional: Mutex<Vec<AdoptableAnimal>>,
    pub region_queries: AtomicUsize,
    pub photo_inserts: AtomicUsize,
    /// Fail the Nth photo insert (0-based, counted across the store's life).
    pub fail_photo_insert_at: Mutex<Option<usize>>,
    pub fail_photo_delete: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_animal(&self, rehomer_id: RehomerId) -> AnimalId {
        let animal_id = AnimalId::generate();
        self.animals.lock().unwrap().insert(
            animal_id,
            StoredAnimal {
                rehomer_id,
                data: sample_new_animal(),
            },
        );
        animal_id
    }

    pub fn seed_photos(&self, animal_id: AnimalId, photos: Vec<AnimalPhoto>) {
        self.photos.lock().unwrap().insert(animal_id, photos);
    }

    pub fn photos_of(&self, animal_id: AnimalId) -> Vec<AnimalPhoto> {
        self.photos
            .lock()
            .unwrap()
            .get(&animal_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_animal(&self, animal_id: AnimalId) -> bool {
        self.animals.lock().unwrap().contains_key(&animal_id)
    }

    fn listing(&self, stored: &StoredAnimal, animal_id: AnimalId) -> Animal {
        Animal {
            id: animal_id,
            name: stored.data.name.clone(),
            gender: stored.data.gender,
            age_in_weeks: stored.data.age_in_weeks,
            neutered: stored.data.neutered,
            description: stored.data.description.clone(),
            address_display_name: stored.data.address_display_name.clone(),
            rehomer_id: stored.rehomer_id,
            location: stored.data.location,
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
            photos: self.photos_of(animal_id),
        }
    }
}

#[async_trait::async_trait]
impl AnimalStore for FakeStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn animal_exists(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<bool> {
        Ok(self
            .animals
            .lock()
            .unwrap()
            .get(&animal_id)
            .is_some_and(|a| a.rehomer_id == rehomer_id))
    }

    async fn insert_animal(&self, rehomer_id: RehomerId, animal: &NewAnimal) -> Result<AnimalId> {
        let animal_id = AnimalId::generate();
        self.animals.lock().unwrap().insert(
            animal_id,
            StoredAnimal {
                rehomer_id,
                data: animal.clone(),
            },
        );
        Ok(animal_id)
    }

    async fn update_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        patch: &AnimalPatch,
    ) -> Result<bool> {
        let mut animals = self.animals.lock().unwrap();
        let Some(stored) = animals
            .get_mut(&animal_id)
            .filter(|a| a.rehomer_id == rehomer_id)
        else {
            return Ok(false);
        };
        if let Some(name) = &patch.name {
            stored.data.name = name.clone();
        }
        if let Some(gender) = patch.gender {
            stored.data.gender = gender;
        }
        if let Some(age) = patch.age_in_weeks {
            stored.data.age_in_weeks = age;
        }
        if let Some(neutered) = patch.neutered {
            stored.data.neutered = neutered;
        }
        if let Some(description) = &patch.description {
            stored.data.description = description.clone();
        }
        if let Some(display) = &patch.address_display_name {
            stored.data.address_display_name = display.clone();
        }
        if let Some(location) = patch.location {
            stored.data.location = location;
        }
        Ok(true)
    }

    async fn delete_animal(&self, _rehomer_id: RehomerId, animal_id: AnimalId) -> Result<()> {
        self.animals.lock().unwrap().remove(&animal_id);
        self.photos.lock().unwrap().remove(&animal_id);
        Ok(())
    }

    async fn get_listing(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<Option<Animal>> {
        let animals = self.animals.lock().unwrap();
        Ok(animals
            .get(&animal_id)
            .filter(|a| a.rehomer_id == rehomer_id)
            .map(|stored| self.listing(stored, animal_id)))
    }

    async fn list_listings(
        &self,
        rehomer_id: RehomerId,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Animal>, u64)> {
        let animals = self.animals.lock().unwrap();
        let mut owned: Vec<(AnimalId, &StoredAnimal)> = animals
            .iter()
            .filter(|(_, a)| a.rehomer_id == rehomer_id)
            .map(|(id, a)| (*id, a))
            .collect();
        owned.sort_by_key(|(id, _)| id.to_string());
        let total = owned.len() as u64;
        let page: Vec<Animal> = owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap())
            .take(usize::try_from(limit).unwrap())
            .map(|(id, stored)| self.listing(stored, id))
            .collect();
        Ok((page, total))
    }

    async fn list_animal_ids_for_rehomer(&self, rehomer_id: RehomerId) -> Result<Vec<AnimalId>> {
        Ok(self
            .animals
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, a)| a.rehomer_id == rehomer_id)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn get_adoptable(&self, animal_id: AnimalId) -> Result<Option<AdoptableAnimal>> {
        Ok(self
            .regional
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.animal_id == animal_id)
            .cloned())
    }

    async fn animals_within_radius(
        &self,
        _latitude: f64,
        _longitude: f64,
        _radius_meters: u32,
    ) -> Result<Vec<AdoptableAnimal>> {
        self.region_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.regional.lock().unwrap().clone())
    }

    async fn list_photos(&self, animal_id: AnimalId) -> Result<Vec<AnimalPhoto>> {
        let mut photos = self.photos_of(animal_id);
        photos.sort_by_key(|p| p.order);
        Ok(photos)
    }

    async fn count_photos(&self, animal_id: AnimalId) -> Result<u64> {
        Ok(self.photos_of(animal_id).len() as u64)
    }

    async fn insert_photo(&self, animal_id: AnimalId, url: &str, order: i32) -> Result<()> {
        let n = self.photo_inserts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_photo_insert_at.lock().unwrap() == Some(n) {
            return Err(anyhow!("injected insert failure"));
        }
        self.photos
            .lock()
            .unwrap()
            .entry(animal_id)
            .or_default()
            .push(AnimalPhoto {
                url: url.to_string(),
                order,
            });
        Ok(())
    }

    async fn delete_photo_by_url(&self, animal_id: AnimalId, url: &str) -> Result<()> {
        if self.fail_photo_delete.load(Ordering::SeqCst) {
            return Err(anyhow!("injected delete failure"));
        }
        if let Some(photos) = self.photos.lock().unwrap().get_mut(&animal_id) {
            photos.retain(|p| p.url != url);
        }
        Ok(())
    }

    async fn restore_photo(&self, animal_id: AnimalId, photo: &AnimalPhoto) -> Result<()> {
        let mut photos = self.photos.lock().unwrap();
        let gallery = photos.entry(animal_id).or_default();
        if !gallery.iter().any(|p| p.url == photo.url) {
            gallery.push(photo.clone());
        }
        Ok(())
    }
}

const BLOB_URL_PREFIX: &str = "https://blobs.test/storage/v1/object/public/animals/";

#[derive(Default)]
pub struct FakeBlobStore {
    pub blobs: Mutex<HashMap<String, Vec<u8>>>,
    pub uploads: AtomicUsize,
    /// Fail the Nth upload (0-based).
    pub fail_upload_at: Mutex<Option<usize>>,
    pub fail_remove: AtomicBool,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn seed_blob(&self, path: &str) -> String {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), vec![0u8; 4]);
        format!("{BLOB_URL_PREFIX}{path}")
    }
}

#[async_trait::async_trait]
impl BlobStore for FakeBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        if *self.fail_upload_at.lock().unwrap() == Some(n) {
            return Err(anyhow!("injected upload failure"));
        }
        self.blobs.lock().unwrap().insert(path.to_string(), bytes);
        Ok(self.public_url(path))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(anyhow!("injected remove failure"));
        }
        let mut blobs = self.blobs.lock().unwrap();
        for path in paths {
            blobs.remove(path);
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = format!("{prefix}/");
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| path.strip_prefix(&dir))
            .map(String::from)
            .collect())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{BLOB_URL_PREFIX}{path}")
    }

    fn blob_path(&self, url: &str) -> Option<String> {
        url.strip_prefix(BLOB_URL_PREFIX).map(String::from)
    }
}

#[derive(Default)]
pub struct FakeCache {
    pub entries: Mutex<HashMap<String, String>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub dels: AtomicUsize,
    pub fail_set: AtomicBool,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait::async_trait]
impl Cache for FakeCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl_seconds: u64) -> Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(anyhow!("injected set failure"));
        }
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.put(key, value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.dels.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct FakeLocationProvider {
    pub location: Mutex<Option<IpLocation>>,
    pub calls: AtomicUsize,
}

impl FakeLocationProvider {
    pub fn returning(city: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            location: Mutex::new(Some(IpLocation {
                city: city.to_string(),
                latitude,
                longitude,
            })),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            location: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl IpLocationProvider for FakeLocationProvider {
    async fn locate(&self, _ip: &str) -> Result<IpLocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.location
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("injected provider failure"))
    }
}

pub fn sample_new_animal() -> NewAnimal {
    NewAnimal {
        name: "Biscuit".to_string(),
        gender: Gender::Female,
        age_in_weeks: 30,
        neutered: true,
        description: "Gentle lurcher".to_string(),
        address_display_name: "Bristol, UK".to_string(),
        location: Coordinates {
            latitude: 51.45,
            longitude: -2.59,
        },
    }
}

pub fn adoptable(name: &str, gender: Gender, neutered: bool, age: i32, distance: f64) -> AdoptableAnimal {
    AdoptableAnimal {
        animal_id: AnimalId::generate(),
        name: name.to_string(),
        gender,
        age_in_weeks: age,
        neutered,
        description: "Friendly".to_string(),
        address_latitude: 51.45,
        address_longitude: -2.59,
        rehomer_id: RehomerId::generate(),
        distance_meters: distance,
        photos: Vec::new(),
    }
}
