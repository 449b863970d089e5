//! Image persistence: mapping catalog references to blobs in the store.
//!
//! * [`ImageReference`] resolves a stored reference to a store key or a public URL.
//! * [`ImageValidator`] checks that a reference points at an existing blob.
//! * [`ImageIngestor`] turns an upload or inline payload into a verified reference.

mod ingest;
mod reference;
mod validator;

use common::storage::StorageError;

pub use ingest::{ImageIngestor, ImageInput, UPLOAD_KEY_PREFIX};
pub use reference::{ImageReference, UPLOADS_PREFIX};
pub use validator::ImageValidator;

/// Errors produced while accepting or verifying an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Malformed inline payload or external URL. User-correctable.
    #[error("invalid image format: {0}")]
    InvalidImageFormat(String),
    /// The request requires an image but none was produced.
    #[error("an image is required")]
    MissingImage,
    /// The blob could not be written or was not found right after writing.
    #[error("image was not saved: {0}")]
    PersistenceFailure(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
