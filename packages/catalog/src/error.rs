use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::image::ImageError;
use crate::service::CatalogError;
use crate::store::StoreError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `INVALID_IMAGE_FORMAT`,
    /// `MISSING_IMAGE`, `NOT_FOUND`, `PAYLOAD_TOO_LARGE`, `UNSUPPORTED_MEDIA_TYPE`,
    /// `PERSISTENCE_FAILURE`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_IMAGE_FORMAT")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "expected a data URI of the form data:image/<type>;base64,<data>")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidImageFormat(String),
    MissingImage,
    NotFound(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    /// The image could not be saved. Detail is logged, not returned.
    PersistenceFailure(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::InvalidImageFormat(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_IMAGE_FORMAT",
                    message: msg,
                },
            ),
            AppError::MissingImage => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "MISSING_IMAGE",
                    message: "An image file or inline image is required".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: msg,
                },
            ),
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorBody {
                    code: "UNSUPPORTED_MEDIA_TYPE",
                    message: msg,
                },
            ),
            AppError::PersistenceFailure(detail) => {
                tracing::error!("Image persistence failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "PERSISTENCE_FAILURE",
                        message: "The image could not be saved, please retry".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => {
                AppError::NotFound("Image not found".into())
            }
            StorageError::Io(e) => AppError::Internal(format!("storage I/O error: {e}")),
        }
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidImageFormat(msg) => AppError::InvalidImageFormat(msg),
            ImageError::MissingImage => AppError::MissingImage,
            ImageError::PersistenceFailure(detail) => AppError::PersistenceFailure(detail),
            ImageError::Storage(e) => AppError::PersistenceFailure(e.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => AppError::NotFound(format!("Product {id} not found")),
            CatalogError::Validation(msg) => AppError::Validation(msg),
            CatalogError::Image(e) => e.into(),
            CatalogError::Store(e) => e.into(),
            CatalogError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}
