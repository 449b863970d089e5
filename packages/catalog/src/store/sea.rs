use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::{NewProduct, Product, ProductPatch, ProductStore, StoreError};
use crate::entity::product;
use crate::image::ImageReference;

/// Postgres-backed record store.
#[derive(Clone)]
pub struct SeaOrmProductStore {
    db: DatabaseConnection,
}

impl SeaOrmProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<product::Model> for Product {
    fn from(m: product::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            rating: m.rating,
            price: m.price,
            discount: m.discount,
            image: m.image.and_then(ImageReference::from_stored),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[async_trait]
impl ProductStore for SeaOrmProductStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let models = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, StoreError> {
        let model = product::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Product::from))
    }

    async fn insert(&self, new: NewProduct) -> Result<Product, StoreError> {
        let now = chrono::Utc::now();
        let active = product::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            rating: Set(new.rating),
            price: Set(new.price),
            discount: Set(new.discount),
            image: Set(new.image.map(ImageReference::into_inner)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(&self.db).await?;
        Ok(model.into())
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        let txn = self.db.begin().await?;

        let Some(existing) = product::Entity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };
        let mut active: product::ActiveModel = existing.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(discount) = patch.discount {
            active.discount = Set(discount);
        }
        if let Some(image) = patch.image {
            active.image = Set(Some(image.into_inner()));
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&txn).await?;
        txn.commit().await?;
        Ok(Some(model.into()))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = product::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn image_references(&self) -> Result<Vec<ImageReference>, StoreError> {
        let images: Vec<Option<String>> = product::Entity::find()
            .select_only()
            .column(product::Column::Image)
            .filter(product::Column::Image.is_not_null())
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(images
            .into_iter()
            .flatten()
            .filter_map(ImageReference::from_stored)
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(product::Entity::find().count(&self.db).await?)
    }
}
