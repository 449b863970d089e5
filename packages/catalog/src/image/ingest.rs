use std::path::Path;
use std::sync::Arc;

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use common::storage::{BlobKey, BlobStore};
use tracing::{debug, info, warn};

use super::{ImageError, ImageReference, ImageValidator};

/// Key prefix for files placed by the upload layer.
pub const UPLOAD_KEY_PREFIX: &str = "image";

/// Key prefix for blobs decoded from inline payloads.
const INLINE_KEY_PREFIX: &str = "base64";

/// Standard alphabet, with or without trailing `=` padding.
const INLINE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The image part of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// A file the upload layer already streamed into the store under this key.
    Uploaded(BlobKey),
    /// An inline data URI: `data:image/<ext>;base64,<payload>`.
    Inline(String),
    /// An absolute `http(s)` URL recorded as-is.
    External(String),
}

impl ImageInput {
    /// Classify a textual image field. Blank text means no image.
    ///
    /// `http(s)` URLs are external references; anything else is treated as an
    /// inline payload and validated as such.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let lower = text.get(..8).unwrap_or(text).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(Self::External(text.to_string()))
        } else {
            Some(Self::Inline(text.to_string()))
        }
    }
}

/// Turns request image input into a reference whose blob is confirmed present.
#[derive(Clone)]
pub struct ImageIngestor {
    store: Arc<dyn BlobStore>,
    validator: ImageValidator,
}

impl ImageIngestor {
    pub fn new(store: Arc<dyn BlobStore>, validator: ImageValidator) -> Self {
        Self { store, validator }
    }

    /// Allocate the store key for an incoming upload.
    ///
    /// The extension comes from the client filename, falling back to the MIME type.
    pub fn upload_key(file_name: Option<&str>, content_type: Option<&str>) -> BlobKey {
        let from_name = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let extension = from_name
            .or_else(|| {
                content_type
                    .and_then(mime_guess::get_mime_extensions_str)
                    .and_then(|exts| exts.first())
                    .map(|ext| ext.to_string())
            })
            .unwrap_or_default();
        BlobKey::generate(UPLOAD_KEY_PREFIX, &extension)
    }

    /// Produce a verified reference from the request's image input.
    ///
    /// Fails with [`ImageError::MissingImage`] when there is no input; a
    /// returned reference's blob existed at the moment of the check.
    pub async fn ingest(&self, input: Option<ImageInput>) -> Result<ImageReference, ImageError> {
        match input {
            None => Err(ImageError::MissingImage),
            Some(ImageInput::Uploaded(key)) => self.accept_upload(key).await,
            Some(ImageInput::Inline(data_uri)) => self.decode_inline(&data_uri).await,
            Some(ImageInput::External(url)) => ImageReference::external(&url),
        }
    }

    async fn accept_upload(&self, key: BlobKey) -> Result<ImageReference, ImageError> {
        let reference = ImageReference::for_key(&key);
        self.confirm(&reference).await?;
        debug!(key = %key, "Accepted uploaded image");
        Ok(reference)
    }

    async fn decode_inline(&self, data_uri: &str) -> Result<ImageReference, ImageError> {
        let (extension, payload) = parse_data_uri(data_uri)?;
        let payload: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        if payload.is_empty() {
            return Err(ImageError::InvalidImageFormat("empty base64 payload".into()));
        }
        let bytes = INLINE_ENGINE
            .decode(payload.as_bytes())
            .map_err(|e| ImageError::InvalidImageFormat(format!("invalid base64 payload: {e}")))?;

        let key = BlobKey::generate(INLINE_KEY_PREFIX, extension);
        self.store
            .put(&key, &bytes)
            .await
            .map_err(|e| ImageError::PersistenceFailure(format!("failed to write {key}: {e}")))?;

        let reference = ImageReference::for_key(&key);
        self.confirm(&reference).await?;
        info!(key = %key, size = bytes.len(), "Stored inline image");
        Ok(reference)
    }

    /// Post-write existence gate.
    async fn confirm(&self, reference: &ImageReference) -> Result<(), ImageError> {
        if self.validator.image_exists(reference).await? {
            Ok(())
        } else {
            warn!(reference = %reference, "Image missing from store after write");
            Err(ImageError::PersistenceFailure(format!(
                "{reference} was not found in the image store"
            )))
        }
    }
}

/// Split `data:image/<ext>;base64,<payload>` into `(ext, payload)`.
fn parse_data_uri(s: &str) -> Result<(&str, &str), ImageError> {
    let invalid = || {
        ImageError::InvalidImageFormat(
            "expected a data URI of the form data:image/<type>;base64,<data>".into(),
        )
    };

    let rest = s.trim().strip_prefix("data:image/").ok_or_else(invalid)?;
    let (subtype, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;

    let subtype_ok = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !subtype_ok || payload.is_empty() {
        return Err(invalid());
    }
    Ok((subtype, payload))
}
