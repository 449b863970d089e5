use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::{ProductFields, ProductFieldsPatch, ProductView};

/// Product fields as sent in a JSON body or as multipart text fields.
///
/// `image` is either an inline data URI (`data:image/<type>;base64,<data>`) or
/// an absolute `http(s)` URL. Multipart requests may send a file part instead.
#[derive(Deserialize, Default, Debug, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[schema(example = "Linen Shirt")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = 4.5)]
    pub rating: Option<f64>,
    #[schema(example = 39.9)]
    pub price: Option<f64>,
    #[schema(example = 10.0)]
    pub discount: Option<f64>,
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub image: Option<String>,
}

impl ProductPayload {
    /// Fields for a create. Absent values default to empty/zero and are
    /// validated by the catalog service.
    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            rating: self.rating.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            discount: self.discount.unwrap_or_default(),
        }
    }

    pub fn into_patch(self) -> ProductFieldsPatch {
        ProductFieldsPatch {
            title: self.title,
            description: self.description,
            rating: self.rating,
            price: self.price,
            discount: self.discount,
        }
    }
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub price: f64,
    pub discount: f64,
    /// Recorded image reference: `/uploads/<key>` or an absolute URL.
    #[schema(example = "/uploads/base64-1714564800000-123456789.png")]
    pub image: Option<String>,
    /// Whether the referenced blob is present. External URLs always report `true`.
    pub image_exists: bool,
    #[schema(example = "http://localhost:3000/uploads/base64-1714564800000-123456789.png")]
    pub full_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductView> for ProductResponse {
    fn from(view: ProductView) -> Self {
        let p = view.product;
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            rating: p.rating,
            price: p.price,
            discount: p.discount,
            image: p.image.map(|r| r.into_inner()),
            image_exists: view.image_exists,
            full_image_url: view.full_image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<ProductResponse>,
}
