use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StorageConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Scheme and host prefixed to store-relative image references.
    /// Default: `http://{host}:{port}`.
    pub public_url: Option<String>,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Postgres URL. Without one the catalog lives in memory for the process lifetime.
    pub url: Option<String>,
}

/// Scheduling of the orphan-cleanup and backup sweeps.
#[derive(Debug, Deserialize, Clone)]
pub struct ReconcileConfig {
    /// Delay after startup before the first sweeps run. Default: 5.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    /// Period of recurring sweeps; 0 runs them once after startup. Default: 0.
    #[serde(default)]
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub orphan_cleanup: bool,
    #[serde(default = "default_true")]
    pub backup: bool,
    #[serde(default = "default_true")]
    pub backup_on_shutdown: bool,
}

fn default_settle_delay_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: default_settle_delay_secs(),
            interval_secs: 0,
            orphan_cleanup: true,
            backup: true,
            backup_on_shutdown: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CATALOG_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., CATALOG__STORAGE__UPLOAD_DIR)
            .add_source(Environment::with_prefix("CATALOG").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
