use std::sync::Arc;

use common::storage::{BlobStore, StorageError};

use super::ImageReference;

/// Checks that image references resolve to blobs that exist.
#[derive(Clone)]
pub struct ImageValidator {
    store: Arc<dyn BlobStore>,
}

impl ImageValidator {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Whether the referenced image exists.
    ///
    /// Absolute URLs are hosted elsewhere and are reported as existing without
    /// a check. Relative references that do not name a valid key never exist.
    pub async fn image_exists(&self, reference: &ImageReference) -> Result<bool, StorageError> {
        if reference.is_external() {
            return Ok(true);
        }
        match reference.to_store_key() {
            Some(key) => self.store.exists(&key).await,
            None => Ok(false),
        }
    }
}
