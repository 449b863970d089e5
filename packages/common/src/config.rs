use std::path::PathBuf;

use serde::Deserialize;

/// Blob storage configuration shared by every process that touches the image store.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Flat directory holding one file per image blob. Default: "./uploads".
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Root of the dated backup partitions. Default: "./backups".
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    /// Largest accepted upload in bytes. Default: 50 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}
fn default_backup_dir() -> PathBuf {
    PathBuf::from("./backups")
}
fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            backup_dir: default_backup_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}
