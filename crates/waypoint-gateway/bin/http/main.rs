use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use waypoint_gateway::{App, AppState, GatewayConfig, Lifecycle};
use waypoint_storage::SqliteRepository;
use waypoint_vault::{BackupEngine, FsSnapshotStore, VaultSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::parse();

    let repository = SqliteRepository::connect(&config.db_path)
        .await
        .with_context(|| format!("failed to open data file {}", config.db_path.display()))?;

    let store = FsSnapshotStore::new(&config.backup_dir);
    let settings = VaultSettings::builder()
        .data_path(&config.db_path)
        .retention_days(config.backup_retention_days)
        .build();
    let engine = Arc::new(BackupEngine::new(store.clone(), settings));

    let lifecycle = Lifecycle::start(
        store,
        Arc::clone(&engine),
        config.backup_enabled,
        config.backup_schedule,
    )
    .await
    .context("failed to initialize the backup subsystem")?;

    let state = AppState::new(Arc::new(repository), engine, config.base_url.clone());
    let router = App::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "starting gateway server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    lifecycle.shutdown();
    info!("gateway stopped");
    Ok(())
}

/// Completes when the process receives ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
