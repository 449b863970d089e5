use std::sync::Arc;

use common::storage::BlobStore;

use crate::config::AppConfig;
use crate::service::CatalogService;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub blob_store: Arc<dyn BlobStore>,
    pub config: Arc<AppConfig>,
}
