//! Catalog record store: one image reference per product.

mod memory;
mod sea;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;

use crate::image::ImageReference;

pub use memory::MemoryProductStore;
pub use sea::SeaOrmProductStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// A catalog entry as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub price: f64,
    pub discount: f64,
    pub image: Option<ImageReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a product about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub price: f64,
    pub discount: f64,
    pub image: Option<ImageReference>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub image: Option<ImageReference>,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, ordered by id.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    async fn find(&self, id: i32) -> Result<Option<Product>, StoreError>;

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Apply `patch`, returning the updated product or `None` if it does not exist.
    async fn update(&self, id: i32, patch: ProductPatch) -> Result<Option<Product>, StoreError>;

    /// Returns `true` if a product was deleted.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// Every image reference currently recorded, one per product that has one.
    async fn image_references(&self) -> Result<Vec<ImageReference>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
