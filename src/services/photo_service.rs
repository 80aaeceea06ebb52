//! Photo gallery saga domain.

use thiserror::Error;

use crate::domain::{AnimalId, RehomerId};

/// An uploaded photo file as received from the transport layer.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Extension taken from the client file name, defaulting to jpg.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or("jpg")
    }
}

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("animal {0} not found or does not belong to this rehomer")]
    NotFound(AnimalId),

    #[error("storage error: {0}")]
    Blob(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Multi-step photo mutations spanning the blob store and the relational
/// store. Both stores are mutated without a shared transaction; on partial
/// failure the saga runs best-effort LIFO compensation and re-raises the
/// original error.
///
/// Concurrent calls against the same animal are not serialized: two racing
/// mutations can observe the same starting photo count and produce duplicate
/// or gapped order values. Neither operation re-checks the 5-photo cap; the
/// request-validation layer owns it.
#[async_trait::async_trait]
pub trait PhotoService: Send + Sync {
    /// Uploads `files` and appends them to the gallery, assigning order
    /// values sequentially from the photo count observed at the start of the
    /// call. On any failure every blob and row created by this call is
    /// removed and the animal row itself is deleted, leaving no orphaned
    /// parent on the initial-creation flow this operation serves.
    ///
    /// # Errors
    ///
    /// - [`PhotoError::NotFound`] when the ownership pre-check fails
    /// - [`PhotoError::Blob`] / [`PhotoError::Database`] on a failed step,
    ///   after compensation has been attempted
    async fn add_photos(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        files: Vec<PhotoUpload>,
    ) -> Result<(), PhotoError>;

    /// Order-preserving gallery update: deletes the rows and blobs for
    /// `delete_urls`, then uploads `files` with order values appended after
    /// the surviving photos. On failure, newly uploaded blobs are removed
    /// and deleted rows are re-inserted with their original url and order;
    /// blobs whose deletion already succeeded are gone for good.
    ///
    /// # Errors
    ///
    /// As [`PhotoService::add_photos`].
    async fn replace_photos(
        &self,
        rehomer_id: RehomerId,
        animal_id: AnimalId,
        files: Vec<PhotoUpload>,
        delete_urls: Vec<String>,
    ) -> Result<(), PhotoError>;
}
