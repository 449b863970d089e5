use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{NewProduct, Product, ProductPatch, ProductStore, StoreError};
use crate::image::ImageReference;

/// Process-local record store, used when no database is configured.
pub struct MemoryProductStore {
    products: DashMap<i32, Product>,
    next_id: AtomicI32,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self {
            products: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }
}

impl Default for MemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.products.iter().map(|e| e.value().clone()).collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(&id).map(|e| e.value().clone()))
    }

    async fn insert(&self, new: NewProduct) -> Result<Product, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = chrono::Utc::now();
        let product = Product {
            id,
            title: new.title,
            description: new.description,
            rating: new.rating,
            price: new.price,
            discount: new.discount,
            image: new.image,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        let Some(mut entry) = self.products.get_mut(&id) else {
            return Ok(None);
        };
        let product = entry.value_mut();

        if let Some(title) = patch.title {
            product.title = title;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(rating) = patch.rating {
            product.rating = rating;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(discount) = patch.discount {
            product.discount = discount;
        }
        if let Some(image) = patch.image {
            product.image = Some(image);
        }
        product.updated_at = chrono::Utc::now();

        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.products.remove(&id).is_some())
    }

    async fn image_references(&self) -> Result<Vec<ImageReference>, StoreError> {
        Ok(self
            .products
            .iter()
            .filter_map(|e| e.value().image.clone())
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.products.len() as u64)
    }
}
