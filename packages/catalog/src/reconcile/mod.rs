//! Reconciliation sweeps over the blob store: orphan cleanup and dated backup.
//!
//! Sweeps are best-effort. They take no lock against request handling, so a
//! blob written for a record that is not yet saved can be swept as an orphan.
//! Sweeps are serialized against each other.

mod backup;
mod orphans;
mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;

use common::storage::BlobStore;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::ReconcileConfig;
use crate::store::ProductStore;

pub use scheduler::run_sweeps;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("orphan cleanup failed: {0}")]
    OrphanCleanup(String),
    #[error("backup failed: {0}")]
    Backup(String),
}

/// Outcome of one orphan cleanup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    /// Keys found in the store.
    pub scanned: usize,
    /// Distinct store keys referenced by catalog entries.
    pub live: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Outcome of one backup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupReport {
    /// Partition directory name, `YYYY-MM-DD`.
    pub partition: String,
    pub copied: usize,
    /// Keys already present in the partition.
    pub skipped: usize,
    pub failed: usize,
}

pub struct Reconciler {
    blobs: Arc<dyn BlobStore>,
    products: Arc<dyn ProductStore>,
    backup_dir: PathBuf,
    sweep_lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        products: Arc<dyn ProductStore>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            blobs,
            products,
            backup_dir: backup_dir.into(),
            sweep_lock: Mutex::new(()),
        }
    }

    /// Run the sweeps enabled in `config`, cleanup before backup. Failures are logged.
    pub async fn run_enabled(&self, config: &ReconcileConfig) {
        if config.orphan_cleanup {
            if let Err(e) = self.cleanup_orphans().await {
                error!(error = %e, "Orphan cleanup failed");
            }
        }
        if config.backup {
            if let Err(e) = self.backup().await {
                error!(error = %e, "Backup failed");
            }
        }
    }

    /// Backup hook for graceful shutdown. Failures are logged.
    pub async fn shutdown_backup(&self, config: &ReconcileConfig) {
        if !config.backup_on_shutdown {
            return;
        }
        info!("Running shutdown backup");
        if let Err(e) = self.backup().await {
            error!(error = %e, "Shutdown backup failed");
        }
    }
}
