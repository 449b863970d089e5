use std::sync::Arc;

use anyhow::Context;
use catalog::build_router;
use catalog::config::AppConfig;
use catalog::database::init_db;
use catalog::reconcile::{Reconciler, run_sweeps};
use catalog::service::CatalogService;
use catalog::state::AppState;
use catalog::store::{MemoryProductStore, ProductStore, SeaOrmProductStore};
use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let blob_store: Arc<dyn BlobStore> = Arc::new(
        FilesystemBlobStore::new(config.storage.upload_dir.clone())
            .await
            .with_context(|| {
                format!(
                    "Failed to open upload directory {}",
                    config.storage.upload_dir.display()
                )
            })?,
    );

    let products: Arc<dyn ProductStore> = match &config.database.url {
        Some(url) => {
            let db = init_db(url)
                .await
                .context("Failed to initialize database")?;
            Arc::new(SeaOrmProductStore::new(db))
        }
        None => {
            warn!("No database configured, products are kept in memory");
            Arc::new(MemoryProductStore::new())
        }
    };

    let catalog = CatalogService::new(
        products.clone(),
        blob_store.clone(),
        config.server.public_base_url(),
    );
    let reconciler = Arc::new(Reconciler::new(
        blob_store.clone(),
        products,
        config.storage.backup_dir.clone(),
    ));

    let shutdown = CancellationToken::new();
    let sweeps = tokio::spawn(run_sweeps(
        reconciler.clone(),
        config.reconcile.clone(),
        shutdown.clone(),
    ));

    let config = Arc::new(config);
    let app = build_router(AppState {
        catalog,
        blob_store,
        config: config.clone(),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, upload_dir = %config.storage.upload_dir.display(), "Catalog server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    if let Err(e) = sweeps.await {
        error!(error = %e, "Sweep task ended abnormally");
    }
    reconciler.shutdown_backup(&config.reconcile).await;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }

    info!("Shutting down gracefully...");
}
