use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use common::storage::BlobKey;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Keys are never reused, so a blob's content never changes.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Serve a blob from the store by key.
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let key = BlobKey::parse(&key).map_err(|_| AppError::NotFound("Image not found".into()))?;
    let reader = state.blob_store.get_stream(&key).await?;

    let mime = mime_guess::from_path(key.as_str()).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, IMMUTABLE_CACHE)
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(e.to_string()))
}
