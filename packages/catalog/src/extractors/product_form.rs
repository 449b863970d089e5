use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{StatusCode, header};
use common::storage::{BlobKey, BlobStore, BoxReader};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::image::{ImageIngestor, ImageInput};
use crate::models::product::ProductPayload;
use crate::state::AppState;

/// Product fields plus image input, from either a JSON or a multipart body.
///
/// For multipart bodies the `image` part may be a file, which is streamed into
/// the blob store before the handler runs. The stored file is removed again if
/// the rest of the body is rejected.
#[derive(Debug)]
pub struct ProductForm {
    pub payload: ProductPayload,
    pub image: Option<ImageInput>,
}

impl FromRequest<AppState> for ProductForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            read_multipart(multipart, state).await
        } else if content_type.starts_with("application/json") {
            let AppJson(mut payload) = AppJson::<ProductPayload>::from_request(req, state).await?;
            let image = payload.image.take().and_then(|s| ImageInput::from_text(&s));
            Ok(Self { payload, image })
        } else {
            Err(AppError::UnsupportedMediaType(
                "Expected multipart/form-data or application/json".into(),
            ))
        }
    }
}

async fn read_multipart(mut multipart: Multipart, state: &AppState) -> Result<ProductForm, AppError> {
    let mut uploaded: Option<BlobKey> = None;

    let result: Result<ProductForm, AppError> = async {
        let mut payload = ProductPayload::default();
        let mut image_text: Option<String> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" if field.file_name().is_some() => {
                    if uploaded.is_some() {
                        return Err(AppError::Validation("Only one image file may be sent".into()));
                    }
                    let key = stream_image_to_store(
                        field,
                        &*state.blob_store,
                        state.config.storage.max_upload_size,
                    )
                    .await?;
                    uploaded = Some(key);
                }
                "image" => image_text = Some(read_text(field, &name).await?),
                "title" => payload.title = Some(read_text(field, &name).await?),
                "description" => payload.description = Some(read_text(field, &name).await?),
                "rating" => payload.rating = Some(read_number(field, &name).await?),
                "price" => payload.price = Some(read_number(field, &name).await?),
                "discount" => payload.discount = Some(read_number(field, &name).await?),
                _ => {} // Ignore unknown fields.
            }
        }

        let image = match &uploaded {
            Some(key) => Some(ImageInput::Uploaded(key.clone())),
            None => image_text.and_then(|s| ImageInput::from_text(&s)),
        };
        Ok(ProductForm { payload, image })
    }
    .await;

    if result.is_err()
        && let Some(key) = &uploaded
        && let Err(e) = state.blob_store.delete(key).await
    {
        warn!(key = %key, error = %e, "Failed to remove upload of rejected request");
    }
    result
}

/// Stream an image part into the store under a fresh key.
///
/// Only `image/*` parts are accepted, up to `max_size` bytes.
async fn stream_image_to_store(
    mut field: Field<'_>,
    blob_store: &dyn BlobStore,
    max_size: u64,
) -> Result<BlobKey, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .map(str::to_string)
        .or_else(|| {
            file_name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_default();
    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return Err(AppError::UnsupportedMediaType(format!(
            "Only image uploads are allowed, got '{content_type}'"
        )));
    }

    let key = ImageIngestor::upload_key(file_name.as_deref(), Some(&content_type));
    let temp_path = std::env::temp_dir().join(format!("catalog-upload-{}", Uuid::new_v4()));

    let result: Result<BlobKey, AppError> = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }
        if total_size == 0 {
            return Err(AppError::Validation("Image file is empty".into()));
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        blob_store
            .put_stream(&key, reader)
            .await
            .map_err(|e| AppError::PersistenceFailure(format!("failed to write {key}: {e}")))?;

        debug!(key = %key, size = total_size, "Stored uploaded image");
        Ok(key)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))
}

async fn read_number(field: Field<'_>, name: &str) -> Result<f64, AppError> {
    let text = read_text(field, name).await?;
    text.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("'{name}' must be a number")))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Multipart error: {e}"))
    }
}
