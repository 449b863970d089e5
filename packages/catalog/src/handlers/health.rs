use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::health::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Service health",
    description = "Reports whether the upload directory exists, how many blobs it holds and \
        their total size, and the number of products. Read-only.",
    responses(
        (status = 200, description = "Health status", body = HealthResponse),
        (status = 500, description = "Store unreadable (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let stats = state
        .blob_store
        .stats()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read store stats: {e}")))?;
    let product_count = state.catalog.products().count().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        upload_dir_exists: stats.root_exists,
        file_count: stats.file_count,
        total_bytes: stats.total_bytes,
        product_count,
    }))
}
