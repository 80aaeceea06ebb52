//! Rehomer listing management domain.

use thiserror::Error;

use crate::domain::{AnimalId, RehomerId};
use crate::models::{AdoptableAnimal, Animal, AnimalPatch, NewAnimal};

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("animal {0} not found or does not belong to this rehomer")]
    NotFound(AnimalId),

    #[error("database error: {0}")]
    Database(String),

    #[error("storage error: {0}")]
    Blob(String),
}

/// Owner-scoped CRUD over animal listings, plus the public adoptable read.
#[async_trait::async_trait]
pub trait ListingService: Send + Sync {
    async fn add_animal(
        &self,
        rehomer_id: RehomerId,
        animal: NewAnimal,
    ) -> Result<AnimalId, ListingError>;

    /// Applies a partial update. An empty patch is a no-op beyond the
    /// ownership check.
    async fn update_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        patch: AnimalPatch,
    ) -> Result<(), ListingError>;

    /// Removes the listing's blobs then its row; photo rows cascade.
    async fn delete_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<(), ListingError>;

    async fn get_listing(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<Animal, ListingError>;

    async fn list_listings(
        &self,
        rehomer_id: RehomerId,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Animal>, u64), ListingError>;

    async fn get_adoptable(&self, animal_id: AnimalId) -> Result<AdoptableAnimal, ListingError>;

    /// Account-cleanup sweep: every owned listing's blobs and rows.
    async fn delete_animals_for_rehomer(&self, rehomer_id: RehomerId) -> Result<(), ListingError>;
}
