//! Store-backed implementation of [`ListingService`].

use std::sync::Arc;

use tracing::info;

use crate::clients::storage::BlobStore;
use crate::db::AnimalStore;
use crate::domain::{AnimalId, RehomerId};
use crate::models::{AdoptableAnimal, Animal, AnimalPatch, NewAnimal};
use crate::services::listing_service::{ListingError, ListingService};

pub struct StoreListingService {
    store: Arc<dyn AnimalStore>,
    blobs: Arc<dyn BlobStore>,
}

impl StoreListingService {
    #[must_use]
    pub fn new(store: Arc<dyn AnimalStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Removes every blob stored under the animal's prefix. Runs before the
    /// row delete so a failure here leaves the listing intact rather than
    /// stranding unreferenced blobs.
    async fn remove_animal_blobs(&self, animal_id: AnimalId) -> Result<(), ListingError> {
        let prefix = animal_id.to_string();
        let names = self
            .blobs
            .list(&prefix)
            .await
            .map_err(|e| ListingError::Blob(format!("failed to list photos: {e:#}")))?;
        if names.is_empty() {
            return Ok(());
        }
        let paths: Vec<String> = names.into_iter().map(|n| format!("{prefix}/{n}")).collect();
        self.blobs
            .remove(&paths)
            .await
            .map_err(|e| ListingError::Blob(format!("failed to remove photos: {e:#}")))
    }
}

#[async_trait::async_trait]
impl ListingService for StoreListingService {
    async fn add_animal(
        &self,
        rehomer_id: RehomerId,
        animal: NewAnimal,
    ) -> Result<AnimalId, ListingError> {
        let id = self
            .store
            .insert_animal(rehomer_id, &animal)
            .await
            .map_err(|e| ListingError::Database(format!("failed to create animal: {e:#}")))?;
        info!("created animal {id} for rehomer {rehomer_id}");
        Ok(id)
    }

    async fn update_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        patch: AnimalPatch,
    ) -> Result<(), ListingError> {
        if patch.is_empty() {
            let exists = self
                .store
                .animal_exists(rehomer_id, animal_id)
                .await
                .map_err(|e| ListingError::Database(format!("ownership check failed: {e:#}")))?;
            return if exists {
                Ok(())
            } else {
                Err(ListingError::NotFound(animal_id))
            };
        }

        let updated = self
            .store
            .update_animal(rehomer_id, animal_id, &patch)
            .await
            .map_err(|e| ListingError::Database(format!("failed to update animal: {e:#}")))?;
        if updated {
            info!("updated animal {animal_id}");
            Ok(())
        } else {
            Err(ListingError::NotFound(animal_id))
        }
    }

    async fn delete_animal(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<(), ListingError> {
        let exists = self
            .store
            .animal_exists(rehomer_id, animal_id)
            .await
            .map_err(|e| ListingError::Database(format!("ownership check failed: {e:#}")))?;
        if !exists {
            return Err(ListingError::NotFound(animal_id));
        }

        self.remove_animal_blobs(animal_id).await?;
        self.store
            .delete_animal(rehomer_id, animal_id)
            .await
            .map_err(|e| ListingError::Database(format!("failed to delete animal: {e:#}")))?;
        info!("deleted animal {animal_id}");
        Ok(())
    }

    async fn get_listing(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<Animal, ListingError> {
        self.store
            .get_listing(rehomer_id, animal_id)
            .await
            .map_err(|e| ListingError::Database(format!("failed to fetch listing: {e:#}")))?
            .ok_or(ListingError::NotFound(animal_id))
    }

    async fn list_listings(
        &self,
        rehomer_id: RehomerId,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Animal>, u64), ListingError> {
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        self.store
            .list_listings(rehomer_id, offset, page_size)
            .await
            .map_err(|e| ListingError::Database(format!("failed to list listings: {e:#}")))
    }

    async fn get_adoptable(&self, animal_id: AnimalId) -> Result<AdoptableAnimal, ListingError> {
        self.store
            .get_adoptable(animal_id)
            .await
            .map_err(|e| ListingError::Database(format!("failed to fetch animal: {e:#}")))?
            .ok_or(ListingError::NotFound(animal_id))
    }

    async fn delete_animals_for_rehomer(&self, rehomer_id: RehomerId) -> Result<(), ListingError> {
        let ids = self
            .store
            .list_animal_ids_for_rehomer(rehomer_id)
            .await
            .map_err(|e| ListingError::Database(format!("failed to list animals: {e:#}")))?;

        for animal_id in ids {
            self.remove_animal_blobs(animal_id).await?;
            self.store
                .delete_animal(rehomer_id, animal_id)
                .await
                .map_err(|e| ListingError::Database(format!("failed to delete animal: {e:#}")))?;
        }
        info!("deleted all animals for rehomer {rehomer_id}");
        Ok(())
    }
}
