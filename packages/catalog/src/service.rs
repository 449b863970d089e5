//! Catalog API surface: product mutations wired through the ingestion
//! pipeline, and reads annotated with image existence.

use std::sync::Arc;

use common::storage::{BlobStore, StorageError};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::image::{ImageError, ImageIngestor, ImageInput, ImageReference, ImageValidator};
use crate::store::{NewProduct, Product, ProductPatch, ProductStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(i32),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Non-image fields of a product to create.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub price: f64,
    pub discount: f64,
}

/// Non-image fields of a product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFieldsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
}

/// A product annotated with the state of its image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub product: Product,
    pub image_exists: bool,
    pub full_image_url: Option<String>,
}

/// Per-product line of an image status report.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatusEntry {
    pub id: i32,
    pub title: String,
    #[schema(value_type = Option<String>, example = "/uploads/image-1714564800000-123456789.png")]
    pub image: Option<ImageReference>,
    pub image_exists: bool,
    pub full_image_url: Option<String>,
}

/// Image health across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatusReport {
    /// Number of products.
    pub total: usize,
    /// Products whose image resolves to an existing blob (or an external URL).
    pub with_image: usize,
    /// Products whose recorded image is absent from the store.
    pub missing_image: usize,
    /// Products with no image recorded at all.
    pub without_image: usize,
    pub products: Vec<ImageStatusEntry>,
}

/// Coordinates the record store with the blob store for every catalog operation.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    blobs: Arc<dyn BlobStore>,
    validator: ImageValidator,
    ingestor: ImageIngestor,
    public_base_url: String,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        blobs: Arc<dyn BlobStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let validator = ImageValidator::new(blobs.clone());
        let ingestor = ImageIngestor::new(blobs.clone(), validator.clone());
        Self {
            products,
            blobs,
            validator,
            ingestor,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn products(&self) -> &Arc<dyn ProductStore> {
        &self.products
    }

    pub async fn list_with_image_status(&self) -> Result<Vec<ProductView>, CatalogError> {
        let products = self.products.list().await?;
        let mut views = Vec::with_capacity(products.len());
        for product in products {
            views.push(self.annotate(product).await);
        }
        Ok(views)
    }

    pub async fn get_by_id_with_image_status(&self, id: i32) -> Result<ProductView, CatalogError> {
        let product = self
            .products
            .find(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        Ok(self.annotate(product).await)
    }

    /// Create a product. The image is written and verified before the record is saved.
    pub async fn create(
        &self,
        fields: ProductFields,
        image: Option<ImageInput>,
    ) -> Result<ProductView, CatalogError> {
        let validated = validate_fields(&fields.title, fields.rating, fields.price, fields.discount)
            .and_then(|()| validate_description(&fields.description));
        if let Err(e) = validated {
            self.discard_upload(image.as_ref()).await;
            return Err(e);
        }

        let reference = self.ingestor.ingest(image).await?;

        let new = NewProduct {
            title: fields.title.trim().to_string(),
            description: fields.description,
            rating: fields.rating,
            price: fields.price,
            discount: fields.discount,
            image: Some(reference.clone()),
        };
        let product = match self.products.insert(new).await {
            Ok(product) => product,
            Err(e) => {
                self.discard_reference(&reference).await;
                return Err(e.into());
            }
        };

        info!(id = product.id, image = %reference, "Created product");
        Ok(self.annotate(product).await)
    }

    /// Update a product, replacing its image when one is supplied.
    ///
    /// The previous blob is deleted only after the record points at the new
    /// one, and only when the two keys differ. That deletion never fails the update.
    pub async fn update(
        &self,
        id: i32,
        fields: ProductFieldsPatch,
        image: Option<ImageInput>,
    ) -> Result<ProductView, CatalogError> {
        if let Err(e) = validate_patch(&fields) {
            self.discard_upload(image.as_ref()).await;
            return Err(e);
        }
        let existing = match self.products.find(id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                self.discard_upload(image.as_ref()).await;
                return Err(CatalogError::NotFound(id));
            }
            Err(e) => {
                self.discard_upload(image.as_ref()).await;
                return Err(e.into());
            }
        };
        let old_reference = existing.image;

        let new_reference = match image {
            Some(input) => Some(self.ingestor.ingest(Some(input)).await?),
            None => None,
        };

        let fresh = new_reference
            .as_ref()
            .filter(|new| old_reference.as_ref() != Some(*new));

        let patch = ProductPatch {
            title: fields.title.map(|t| t.trim().to_string()),
            description: fields.description,
            rating: fields.rating,
            price: fields.price,
            discount: fields.discount,
            image: new_reference.clone(),
        };
        let updated = match self.products.update(id, patch).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                if let Some(reference) = fresh {
                    self.discard_reference(reference).await;
                }
                return Err(CatalogError::NotFound(id));
            }
            Err(e) => {
                if let Some(reference) = fresh {
                    self.discard_reference(reference).await;
                }
                return Err(e.into());
            }
        };

        if let (Some(old), Some(new)) = (&old_reference, &new_reference) {
            self.release_replaced(old, new).await;
        }

        info!(id, image_replaced = new_reference.is_some(), "Updated product");
        Ok(self.annotate(updated).await)
    }

    /// Delete a product and its blob. A failed blob deletion is logged only.
    pub async fn delete(&self, id: i32) -> Result<(), CatalogError> {
        let product = self
            .products
            .find(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        if let Some(reference) = &product.image {
            self.discard_reference(reference).await;
        }

        if !self.products.delete(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        info!(id, "Deleted product");
        Ok(())
    }

    pub async fn image_status_report(&self) -> Result<ImageStatusReport, CatalogError> {
        let views = self.list_with_image_status().await?;

        let mut report = ImageStatusReport {
            total: views.len(),
            with_image: 0,
            missing_image: 0,
            without_image: 0,
            products: Vec::with_capacity(views.len()),
        };
        for view in views {
            match (&view.product.image, view.image_exists) {
                (None, _) => report.without_image += 1,
                (Some(_), true) => report.with_image += 1,
                (Some(_), false) => report.missing_image += 1,
            }
            report.products.push(ImageStatusEntry {
                id: view.product.id,
                title: view.product.title,
                image: view.product.image,
                image_exists: view.image_exists,
                full_image_url: view.full_image_url,
            });
        }
        Ok(report)
    }

    /// Attach existence and public URL. Never fails: a store error reads as missing.
    async fn annotate(&self, product: Product) -> ProductView {
        let (image_exists, full_image_url) = match &product.image {
            Some(reference) => {
                let exists = match self.validator.image_exists(reference).await {
                    Ok(exists) => exists,
                    Err(e) => {
                        warn!(id = product.id, image = %reference, error = %e, "Image check failed");
                        false
                    }
                };
                (exists, Some(reference.to_public_url(&self.public_base_url)))
            }
            None => (false, None),
        };
        ProductView {
            product,
            image_exists,
            full_image_url,
        }
    }

    async fn release_replaced(&self, old: &ImageReference, new: &ImageReference) {
        let Some(old_key) = old.to_store_key() else {
            return;
        };
        if new.to_store_key().as_ref() == Some(&old_key) {
            debug!(key = %old_key, "Image unchanged, keeping blob");
            return;
        }
        match self.blobs.delete(&old_key).await {
            Ok(_) => debug!(key = %old_key, "Deleted replaced image"),
            Err(e) => warn!(key = %old_key, error = %e, "Failed to delete replaced image"),
        }
    }

    /// Best-effort removal of a blob no record will point at.
    async fn discard_reference(&self, reference: &ImageReference) {
        let Some(key) = reference.to_store_key() else {
            return;
        };
        if let Err(e) = self.blobs.delete(&key).await {
            warn!(key = %key, error = %e, "Failed to delete image");
        }
    }

    /// Drop a file the upload layer stored for a request that is being rejected.
    async fn discard_upload(&self, input: Option<&ImageInput>) {
        if let Some(ImageInput::Uploaded(key)) = input {
            self.discard_reference(&ImageReference::for_key(key)).await;
        }
    }
}

const MAX_TITLE_CHARS: usize = 256;
const MAX_DESCRIPTION_CHARS: usize = 10_000;

fn validate_fields(title: &str, rating: f64, price: f64, discount: f64) -> Result<(), CatalogError> {
    validate_title(title)?;
    validate_rating(rating)?;
    validate_price(price)?;
    validate_discount(discount)
}

fn validate_patch(fields: &ProductFieldsPatch) -> Result<(), CatalogError> {
    if let Some(title) = &fields.title {
        validate_title(title)?;
    }
    if let Some(description) = &fields.description {
        validate_description(description)?;
    }
    if let Some(rating) = fields.rating {
        validate_rating(rating)?;
    }
    if let Some(price) = fields.price {
        validate_price(price)?;
    }
    if let Some(discount) = fields.discount {
        validate_discount(discount)?;
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), CatalogError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(CatalogError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), CatalogError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(CatalogError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<(), CatalogError> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(CatalogError::Validation("Rating must be between 0 and 5".into()));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Validation("Price must be >= 0".into()));
    }
    Ok(())
}

fn validate_discount(discount: f64) -> Result<(), CatalogError> {
    if !(0.0..=100.0).contains(&discount) {
        return Err(CatalogError::Validation(
            "Discount must be between 0 and 100".into(),
        ));
    }
    Ok(())
}
