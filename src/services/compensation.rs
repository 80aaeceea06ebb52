//! Typed compensation stack for the photo saga.
//!
//! Each mutating sub-step pushes the undo action that reverses it. On
//! failure the stack unwinds LIFO; every undo runs in its own error boundary
//! so one failed compensation never blocks the rest, and the saga's original
//! error is what callers see. Unwinding is best-effort cleanup, not a
//! transaction.

use tracing::{info, warn};

use crate::clients::storage::BlobStore;
use crate::db::AnimalStore;
use crate::domain::{AnimalId, RehomerId};
use crate::models::AnimalPhoto;

/// One reversible sub-step of a photo saga.
#[derive(Debug, Clone)]
pub enum UndoAction {
    /// Remove a blob uploaded during this saga call.
    RemoveBlob { path: String },
    /// Delete a photo row inserted during this saga call.
    DeletePhotoRow { animal_id: AnimalId, url: String },
    /// Re-insert a photo row deleted during this saga call, with its
    /// original url and order. Conflict-tolerant.
    RestorePhotoRow {
        animal_id: AnimalId,
        photo: AnimalPhoto,
    },
    /// Delete the animal row itself. Only pushed by the add-photos saga,
    /// which runs as part of initial-creation flows where a failed gallery
    /// must not leave an orphaned parent.
    DeleteAnimalRow {
        rehomer_id: RehomerId,
        animal_id: AnimalId,
    },
}

#[derive(Default)]
pub struct CompensationStack {
    actions: Vec<UndoAction>,
}

impl CompensationStack {
    #[must_use]
    pub const fn new() -> Self {
        Self { actions: Vec::new() }
    }

    pub fn push(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Unwinds the stack LIFO. Failures are logged and swallowed; they must
    /// never surface in place of the error that triggered the unwind.
    pub async fn unwind(mut self, store: &dyn AnimalStore, blobs: &dyn BlobStore) {
        while let Some(action) = self.actions.pop() {
            match &action {
                UndoAction::RemoveBlob { path } => {
                    match blobs.remove(std::slice::from_ref(path)).await {
                        Ok(()) => info!("compensation: removed uploaded blob {path}"),
                        Err(e) => warn!("compensation failed to remove blob {path}: {e:#}"),
                    }
                }
                UndoAction::DeletePhotoRow { animal_id, url } => {
                    match store.delete_photo_by_url(*animal_id, url).await {
                        Ok(()) => info!("compensation: deleted photo row {url}"),
                        Err(e) => warn!("compensation failed to delete photo row {url}: {e:#}"),
                    }
                }
                UndoAction::RestorePhotoRow { animal_id, photo } => {
                    match store.restore_photo(*animal_id, photo).await {
                        Ok(()) => info!(
                            "compensation: restored photo row {} (order {})",
                            photo.url, photo.order
                        ),
                        Err(e) => {
                            warn!("compensation failed to restore photo row {}: {e:#}", photo.url);
                        }
                    }
                }
                UndoAction::DeleteAnimalRow {
                    rehomer_id,
                    animal_id,
                } => match store.delete_animal(*rehomer_id, *animal_id).await {
                    Ok(()) => info!("compensation: deleted animal row {animal_id}"),
                    Err(e) => {
                        warn!("compensation failed to delete animal row {animal_id}: {e:#}");
                    }
                },
            }
        }
    }
}
