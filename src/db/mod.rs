//! Relational persistence. [`Store`] wraps the sea-orm connection and exposes
//! the [`AnimalStore`] seam the services are written against, so tests can
//! substitute an in-memory fake.

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tracing::info;

use crate::domain::{AnimalId, RehomerId};
use crate::models::{AdoptableAnimal, Animal, AnimalPatch, AnimalPhoto, NewAnimal};

pub mod migrator;
pub mod repositories;

use repositories::animal::AnimalRepository;
use repositories::photo::PhotoRepository;

/// Narrow relational seam for animal listings and photo rows.
///
/// Every mutation is owner-scoped where the caller supplies a [`RehomerId`];
/// photo-row operations assume the caller has already performed the
/// existence/ownership check.
#[async_trait::async_trait]
pub trait AnimalStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    /// True when the animal exists and belongs to the rehomer.
    async fn animal_exists(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<bool>;

    async fn insert_animal(&self, rehomer_id: RehomerId, animal: &NewAnimal) -> Result<AnimalId>;

    /// Returns false when no owned row matched the update.
    async fn update_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        patch: &AnimalPatch,
    ) -> Result<bool>;

    async fn delete_animal(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<()>;

    async fn get_listing(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<Option<Animal>>;

    async fn list_listings(
        &self,
        rehomer_id: RehomerId,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Animal>, u64)>;

    async fn list_animal_ids_for_rehomer(&self, rehomer_id: RehomerId) -> Result<Vec<AnimalId>>;

    async fn get_adoptable(&self, animal_id: AnimalId) -> Result<Option<AdoptableAnimal>>;

    /// All animals within `radius_meters` of the point, sorted by geographic
    /// distance ascending. Unfiltered; attribute filtering happens above.
    async fn animals_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<AdoptableAnimal>>;

    async fn list_photos(&self, animal_id: AnimalId) -> Result<Vec<AnimalPhoto>>;

    async fn count_photos(&self, animal_id: AnimalId) -> Result<u64>;

    async fn insert_photo(&self, animal_id: AnimalId, url: &str, order: i32) -> Result<()>;

    async fn delete_photo_by_url(&self, animal_id: AnimalId, url: &str) -> Result<()>;

    /// Conflict-tolerant re-insert used by saga compensation.
    async fn restore_photo(&self, animal_id: AnimalId, photo: &AnimalPhoto) -> Result<()>;
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn animal_repo(&self) -> AnimalRepository {
        AnimalRepository::new(self.conn.clone())
    }

    fn photo_repo(&self) -> PhotoRepository {
        PhotoRepository::new(self.conn.clone())
    }
}

#[async_trait::async_trait]
impl AnimalStore for Store {
    async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    async fn animal_exists(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<bool> {
        self.animal_repo().exists(rehomer_id, animal_id).await
    }

    async fn insert_animal(&self, rehomer_id: RehomerId, animal: &NewAnimal) -> Result<AnimalId> {
        self.animal_repo().insert(rehomer_id, animal).await
    }

    async fn update_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        patch: &AnimalPatch,
    ) -> Result<bool> {
        self.animal_repo().update(rehomer_id, animal_id, patch).await
    }

    async fn delete_animal(&self, rehomer_id: RehomerId, animal_id: AnimalId) -> Result<()> {
        self.animal_repo().delete(rehomer_id, animal_id).await
    }

    async fn get_listing(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<Option<Animal>> {
        self.animal_repo().get_listing(rehomer_id, animal_id).await
    }

    async fn list_listings(
        &self,
        rehomer_id: RehomerId,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Animal>, u64)> {
        self.animal_repo().list_listings(rehomer_id, offset, limit).await
    }

    async fn list_animal_ids_for_rehomer(&self, rehomer_id: RehomerId) -> Result<Vec<AnimalId>> {
        self.animal_repo().list_ids_for_rehomer(rehomer_id).await
    }

    async fn get_adoptable(&self, animal_id: AnimalId) -> Result<Option<AdoptableAnimal>> {
        self.animal_repo().get_adoptable(animal_id).await
    }

    async fn animals_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<AdoptableAnimal>> {
        self.animal_repo()
            .within_radius(latitude, longitude, radius_meters)
            .await
    }

    async fn list_photos(&self, animal_id: AnimalId) -> Result<Vec<AnimalPhoto>> {
        self.photo_repo().list(animal_id).await
    }

    async fn count_photos(&self, animal_id: AnimalId) -> Result<u64> {
        self.photo_repo().count(animal_id).await
    }

    async fn insert_photo(&self, animal_id: AnimalId, url: &str, order: i32) -> Result<()> {
        self.photo_repo().insert(animal_id, url, order).await
    }

    async fn delete_photo_by_url(&self, animal_id: AnimalId, url: &str) -> Result<()> {
        self.photo_repo().delete_by_url(animal_id, url).await
    }

    async fn restore_photo(&self, animal_id: AnimalId, photo: &AnimalPhoto) -> Result<()> {
        self.photo_repo().restore(animal_id, photo).await
    }
}
