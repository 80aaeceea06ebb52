//! Saga implementation of [`PhotoService`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::clients::storage::BlobStore;
use crate::db::AnimalStore;
use crate::domain::{AnimalId, RehomerId};
use crate::services::compensation::{CompensationStack, UndoAction};
use crate::services::photo_service::{PhotoError, PhotoService, PhotoUpload};

pub struct SagaPhotoService {
    store: Arc<dyn AnimalStore>,
    blobs: Arc<dyn BlobStore>,
}

impl SagaPhotoService {
    #[must_use]
    pub fn new(store: Arc<dyn AnimalStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    async fn check_ownership(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    ) -> Result<(), PhotoError> {
        let exists = self
            .store
            .animal_exists(rehomer_id, animal_id)
            .await
            .map_err(|e| PhotoError::Database(format!("ownership check failed: {e:#}")))?;
        if exists {
            Ok(())
        } else {
            Err(PhotoError::NotFound(animal_id))
        }
    }

    fn blob_name(animal_id: AnimalId, index: usize, extension: &str) -> String {
        format!(
            "{animal_id}/{}-{index}.{extension}",
            Utc::now().timestamp_millis()
        )
    }

    /// Uploads one file and inserts its row, pushing an undo per completed
    /// sub-step. Returns the failing step's error without unwinding; the
    /// caller owns the stack.
    async fn upload_and_insert(
        &self,
        animal_id: AnimalId,
        file: &PhotoUpload,
        index: usize,
        order: i32,
        comp: &mut CompensationStack,
    ) -> Result<(), PhotoError> {
        let path = Self::blob_name(animal_id, index, file.extension());

        let url = self
            .blobs
            .upload(&path, file.bytes.clone(), &file.content_type)
            .await
            .map_err(|e| PhotoError::Blob(format!("failed to upload {}: {e:#}", file.file_name)))?;
        comp.push(UndoAction::RemoveBlob { path });

        self.store
            .insert_photo(animal_id, &url, order)
            .await
            .map_err(|e| PhotoError::Database(format!("failed to insert photo row: {e:#}")))?;
        comp.push(UndoAction::DeletePhotoRow {
            animal_id,
            url,
        });

        info!("stored photo for animal {animal_id} at order {order}");
        Ok(())
    }
}

#[async_trait::async_trait]
impl PhotoService for SagaPhotoService {
    async fn add_photos(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        files: Vec<PhotoUpload>,
    ) -> Result<(), PhotoError> {
        self.check_ownership(rehomer_id, animal_id).await?;

        let starting_count = self
            .store
            .count_photos(animal_id)
            .await
            .map_err(|e| PhotoError::Database(format!("photo count failed: {e:#}")))?;

        let mut comp = CompensationStack::new();
        // The existence check passed; this saga only runs inside
        // initial-creation flows, so a failed gallery also removes the
        // freshly created parent row.
        comp.push(UndoAction::DeleteAnimalRow {
            rehomer_id,
            animal_id,
        });

        for (index, file) in files.iter().enumerate() {
            let order = i32::try_from(starting_count).unwrap_or(i32::MAX).saturating_add(
                i32::try_from(index).unwrap_or(i32::MAX),
            );
            if let Err(e) = self
                .upload_and_insert(animal_id, file, index, order, &mut comp)
                .await
            {
                error!("error uploading animal photos for {animal_id}: {e}");
                comp.unwind(self.store.as_ref(), self.blobs.as_ref()).await;
                return Err(e);
            }
        }

        Ok(())
    }

    async fn replace_photos(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        files: Vec<PhotoUpload>,
        delete_urls: Vec<String>,
    ) -> Result<(), PhotoError> {
        self.check_ownership(rehomer_id, animal_id).await?;

        let existing = self
            .store
            .list_photos(animal_id)
            .await
            .map_err(|e| PhotoError::Database(format!("photo backup failed: {e:#}")))?;

        let mut comp = CompensationStack::new();

        for url in &delete_urls {
            let Some(path) = self.blobs.blob_path(url) else {
                warn!("could not extract blob path from url {url}, skipping");
                continue;
            };
            let backup = existing.iter().find(|p| &p.url == url).cloned();

            if let Err(e) = self.store.delete_photo_by_url(animal_id, url).await {
                let err = PhotoError::Database(format!("failed to delete photo row {url}: {e:#}"));
                error!("error updating animal photos for {animal_id}: {err}");
                comp.unwind(self.store.as_ref(), self.blobs.as_ref()).await;
                return Err(err);
            }
            if let Some(photo) = backup {
                comp.push(UndoAction::RestorePhotoRow { animal_id, photo });
            }

            // Past this call there is no way back for the blob itself.
            if let Err(e) = self.blobs.remove(std::slice::from_ref(&path)).await {
                let err = PhotoError::Blob(format!("failed to delete photo {path}: {e:#}"));
                error!("error updating animal photos for {animal_id}: {err}");
                comp.unwind(self.store.as_ref(), self.blobs.as_ref()).await;
                return Err(err);
            }
            info!("deleted photo {path} for animal {animal_id}");
        }

        let remaining = self
            .store
            .count_photos(animal_id)
            .await
            .map_err(|e| PhotoError::Database(format!("photo count failed: {e:#}")))?;
        let next_order = i32::try_from(remaining).unwrap_or(i32::MAX);

        for (index, file) in files.iter().enumerate() {
            let order = next_order.saturating_add(i32::try_from(index).unwrap_or(i32::MAX));
            if let Err(e) = self
                .upload_and_insert(animal_id, file, index, order, &mut comp)
                .await
            {
                error!("error updating animal photos for {animal_id}: {e}");
                comp.unwind(self.store.as_ref(), self.blobs.as_ref()).await;
                return Err(e);
            }
        }

        info!("updated photos for animal {animal_id}");
        Ok(())
    }
}
