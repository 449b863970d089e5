use chrono::{NaiveDate, Utc};
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::{BlobKey, BlobStore, StorageError};
use tracing::{debug, info, warn};

use super::{BackupReport, ReconcileError, Reconciler};

/// Staging directory for in-flight copies, beside the partitions.
const STAGING_DIR: &str = ".staging";

impl Reconciler {
    /// Copy the store into today's partition (UTC date).
    pub async fn backup(&self) -> Result<BackupReport, ReconcileError> {
        self.backup_for_date(Utc::now().date_naive()).await
    }

    /// Copy every blob into the `YYYY-MM-DD` partition for `date`.
    ///
    /// A key already present in the partition is never copied again. Copies
    /// are staged in the backup root so a partition holds only blob files.
    pub async fn backup_for_date(&self, date: NaiveDate) -> Result<BackupReport, ReconcileError> {
        let _guard = self.sweep_lock.lock().await;

        let partition = date.format("%Y-%m-%d").to_string();
        let target = FilesystemBlobStore::with_staging_dir(
            self.backup_dir.join(&partition),
            self.backup_dir.join(STAGING_DIR),
        )
        .await
            .map_err(|e| ReconcileError::Backup(format!("creating partition {partition}: {e}")))?;

        let keys = self
            .blobs
            .list()
            .await
            .map_err(|e| ReconcileError::Backup(format!("listing store: {e}")))?;

        let mut report = BackupReport {
            partition,
            ..Default::default()
        };

        for key in &keys {
            match target.exists(key).await {
                Ok(true) => {
                    report.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to check backup copy");
                    report.failed += 1;
                    continue;
                }
            }

            match copy_blob(&*self.blobs, &target, key).await {
                Ok(size) => {
                    debug!(key = %key, size, "Backed up image");
                    report.copied += 1;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to back up image");
                    report.failed += 1;
                }
            }
        }

        info!(
            partition = %report.partition,
            copied = report.copied,
            skipped = report.skipped,
            failed = report.failed,
            "Backup finished"
        );
        Ok(report)
    }
}

async fn copy_blob(
    from: &dyn BlobStore,
    to: &dyn BlobStore,
    key: &BlobKey,
) -> Result<u64, StorageError> {
    let reader = from.get_stream(key).await?;
    to.put_stream(key, reader).await
}
