use std::collections::HashSet;

use common::storage::BlobKey;
use tracing::{debug, info, warn};

use super::{OrphanReport, ReconcileError, Reconciler};
use crate::image::ImageReference;

impl Reconciler {
    /// Delete every blob that no catalog entry references.
    ///
    /// References are normalized to store keys before comparison, so
    /// `/uploads/a.png`, `uploads/a.png` and `a.png` all keep `a.png` alive.
    pub async fn cleanup_orphans(&self) -> Result<OrphanReport, ReconcileError> {
        let _guard = self.sweep_lock.lock().await;

        let keys = self
            .blobs
            .list()
            .await
            .map_err(|e| ReconcileError::OrphanCleanup(format!("listing store: {e}")))?;

        let live: HashSet<BlobKey> = self
            .products
            .image_references()
            .await
            .map_err(|e| ReconcileError::OrphanCleanup(format!("loading references: {e}")))?
            .iter()
            .filter_map(ImageReference::to_store_key)
            .collect();

        let mut report = OrphanReport {
            scanned: keys.len(),
            live: live.len(),
            ..Default::default()
        };

        for key in keys.iter().filter(|key| !live.contains(*key)) {
            match self.blobs.delete(key).await {
                Ok(true) => {
                    debug!(key = %key, "Deleted orphaned image");
                    report.deleted += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to delete orphaned image");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            live = report.live,
            deleted = report.deleted,
            failed = report.failed,
            "Orphan cleanup finished"
        );
        Ok(report)
    }
}
