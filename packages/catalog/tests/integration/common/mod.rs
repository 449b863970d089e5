use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use catalog::config::{
    AppConfig, CorsConfig, DatabaseConfig, ReconcileConfig, ServerConfig, StorageConfig,
};
use catalog::image::ImageReference;
use catalog::service::CatalogService;
use catalog::state::AppState;
use catalog::store::{MemoryProductStore, NewProduct, ProductStore};
use ::common::storage::filesystem::FilesystemBlobStore;
use ::common::storage::{BlobKey, BlobStore};

pub mod routes {
    pub const PRODUCTS: &str = "/api/v1/products";
    pub const IMAGE_STATUS: &str = "/api/v1/products/image-status";
    pub const HEALTH: &str = "/api/v1/health";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn product(id: i32) -> String {
        format!("/api/v1/products/{id}")
    }
}

/// A 1x1 transparent GIF.
pub const GIF_BYTES: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// A running test server backed by the in-memory record store and a
/// temporary upload directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub blob_store: Arc<FilesystemBlobStore>,
    pub products: Arc<MemoryProductStore>,
    pub upload_dir: PathBuf,
    _dir: tempfile::TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_max_upload(50 * 1024 * 1024).await
    }

    pub async fn spawn_with_max_upload(max_upload_size: u64) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let upload_dir = dir.path().join("uploads");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                public_url: Some("http://catalog.test".to_string()),
                cors: CorsConfig::default(),
            },
            database: DatabaseConfig::default(),
            storage: StorageConfig {
                upload_dir: upload_dir.clone(),
                backup_dir: dir.path().join("backups"),
                max_upload_size,
            },
            reconcile: ReconcileConfig::default(),
        };

        let blob_store = Arc::new(
            FilesystemBlobStore::new(upload_dir.clone())
                .await
                .expect("Failed to open blob store"),
        );
        let products = Arc::new(MemoryProductStore::new());
        let catalog = CatalogService::new(
            products.clone(),
            blob_store.clone(),
            app_config.server.public_base_url(),
        );

        let state = AppState {
            catalog,
            blob_store: blob_store.clone(),
            config: Arc::new(app_config),
        };
        let app = catalog::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            blob_store,
            products,
            upload_dir,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_form(&self, path: &str, form: reqwest::multipart::Form) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Create a product from an inline PNG and return its `id`.
    pub async fn create_product(&self, title: &str) -> i32 {
        let res = self
            .post_json(
                routes::PRODUCTS,
                &serde_json::json!({
                    "title": title,
                    "description": "A product",
                    "rating": 4.0,
                    "price": 12.5,
                    "discount": 0.0,
                    "image": "data:image/png;base64,AAAA",
                }),
            )
            .await;
        assert_eq!(res.status, 201, "create_product failed: {}", res.text);
        res.id()
    }

    /// Insert a record directly, bypassing image ingestion.
    pub async fn insert_raw_product(&self, title: &str, image: Option<&str>) -> i32 {
        self.products
            .insert(NewProduct {
                title: title.to_string(),
                description: String::new(),
                rating: 0.0,
                price: 1.0,
                discount: 0.0,
                image: image.and_then(ImageReference::from_stored),
            })
            .await
            .expect("Failed to insert product")
            .id
    }

    /// Store key behind a `/uploads/<key>` reference.
    pub fn key_of(reference: &str) -> BlobKey {
        ImageReference::from_stored(reference)
            .and_then(|r| r.to_store_key())
            .expect("reference should name a store key")
    }

    pub async fn blob_exists(&self, reference: &str) -> bool {
        self.blob_store
            .exists(&Self::key_of(reference))
            .await
            .expect("exists check failed")
    }

    pub async fn blob_count(&self) -> usize {
        self.blob_store.list().await.expect("list failed").len()
    }

    pub fn upload_path(&self, key: &str) -> PathBuf {
        Path::new(&self.upload_dir).join(key)
    }
}

/// Multipart form with the standard product text fields.
pub fn product_form(title: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("description", "Multipart product")
        .text("rating", "3.5")
        .text("price", "20")
        .text("discount", "15")
}

pub fn image_part(file_name: &str, mime: &str, bytes: &[u8]) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("Failed to set MIME type")
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
