use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::product_form::ProductForm;
use crate::models::product::{ProductListResponse, ProductPayload, ProductResponse};
use crate::service::ImageStatusReport;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products",
    description = "Returns every product ordered by id, each annotated with `imageExists` \
        and `fullImageUrl`.",
    responses(
        (status = 200, description = "Product list", body = ProductListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, AppError> {
    let views = state.catalog.list_with_image_status().await?;
    Ok(Json(ProductListResponse {
        data: views.into_iter().map(ProductResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Creates a product with its image. Send `multipart/form-data` with an `image` \
        file part (max 50 MB, `image/*` only) or an `image` text part, or JSON with an `image` \
        string. Text images are inline data URIs (`data:image/<type>;base64,<data>`) or absolute \
        `http(s)` URLs. The record is saved only after the image is confirmed in the store.",
    request_body(content = ProductPayload, description = "Product fields and image"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input (VALIDATION_ERROR, INVALID_IMAGE_FORMAT, MISSING_IMAGE)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 415, description = "Not an image (UNSUPPORTED_MEDIA_TYPE)", body = ErrorBody),
        (status = 500, description = "Image not saved (PERSISTENCE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn create_product(
    State(state): State<AppState>,
    form: ProductForm,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .catalog
        .create(form.payload.into_fields(), form.image)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(view))))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, AppError> {
    let view = state.catalog.get_by_id_with_image_status(id).await?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Updates the supplied fields. When an image is supplied the previous one is \
        deleted after the record points at the new image. Accepts the same bodies as create.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content = ProductPayload, description = "Fields to change and optional image"),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid input (VALIDATION_ERROR, INVALID_IMAGE_FORMAT)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 415, description = "Not an image (UNSUPPORTED_MEDIA_TYPE)", body = ErrorBody),
        (status = 500, description = "Image not saved (PERSISTENCE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: ProductForm,
) -> Result<Json<ProductResponse>, AppError> {
    let view = state
        .catalog
        .update(id, form.payload.into_patch(), form.image)
        .await?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Deletes the product and its stored image.",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/products/image-status",
    tag = "Products",
    operation_id = "imageStatusReport",
    summary = "Image status report",
    description = "Counts products whose image is present, missing from the store, or absent, \
        with a per-product breakdown.",
    responses(
        (status = 200, description = "Report", body = ImageStatusReport),
    ),
)]
#[instrument(skip(state))]
pub async fn image_status(
    State(state): State<AppState>,
) -> Result<Json<ImageStatusReport>, AppError> {
    Ok(Json(state.catalog.image_status_report().await?))
}
