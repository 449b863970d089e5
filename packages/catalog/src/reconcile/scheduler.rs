use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Reconciler;
use crate::config::ReconcileConfig;

/// Run the enabled sweeps once after the settle delay, then every
/// `interval_secs` if that is non-zero.
///
/// Cancellation is observed only between sweeps; a sweep in progress runs to completion.
pub async fn run_sweeps(
    reconciler: Arc<Reconciler>,
    config: ReconcileConfig,
    shutdown: CancellationToken,
) {
    if !config.orphan_cleanup && !config.backup {
        return;
    }

    info!(
        settle_delay_secs = config.settle_delay_secs,
        interval_secs = config.interval_secs,
        "Scheduling reconciliation sweeps"
    );

    tokio::select! {
        _ = shutdown.cancelled() => return,
        _ = tokio::time::sleep(Duration::from_secs(config.settle_delay_secs)) => {}
    }
    reconciler.run_enabled(&config).await;

    if config.interval_secs == 0 {
        return;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
    // The first tick fires immediately; the startup sweep already covered it.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => reconciler.run_enabled(&config).await,
        }
    }
    info!("Reconciliation sweeps stopped");
}
