mod config;
mod error;
mod health;
mod logger;
mod registry;
mod scheduler;
mod sync;

use std::{sync::Arc, time::Duration};

use astral_repository::RepositoryManager;
use dotenvy::dotenv;
use registry::ChainRegistry;
use scheduler::SyncScheduler;
use sync::SyncTask;
use tokio::{select, signal::unix::SignalKind};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // Install rustls crypto provider before any TLS connections
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenv().ok();
    let config = config::initialize_configuration();
    logger::initialize(&config.logger, &config.telemetry);

    tracing::info!(
        "Astral attestation sync node v{} ({} environment)",
        env!("CARGO_PKG_VERSION"),
        config::current_env()
    );

    let repository = Arc::new(
        RepositoryManager::connect(&config.repository)
            .await
            .expect("Failed to connect to the database"),
    );

    let registry = Arc::new(
        ChainRegistry::initialize(&config.chains, &config.sync, &repository)
            .await
            .expect("Failed to initialize chain registry"),
    );
    if registry.is_empty() {
        tracing::warn!("No chains are enabled; the node will idle");
    }

    let shutdown = CancellationToken::new();

    // Sync scheduler: polls every chain on an interval, with on-demand
    // triggers via SIGHUP.
    let chain_ids: Vec<_> = registry
        .chains()
        .iter()
        .map(|chain| chain.chain_id)
        .collect();
    let sync_task = Arc::new(SyncTask::new(
        Arc::clone(&registry),
        Arc::clone(&repository),
        config.sync.clone(),
    ));
    let (sync_scheduler, scheduler_handle) =
        SyncScheduler::new(sync_task, chain_ids.clone(), config.sync.clone());

    let scheduler_task = if config.sync.enabled {
        Some(tokio::spawn(sync_scheduler.run(shutdown.clone())))
    } else {
        tracing::warn!("Attestation sync is disabled by configuration");
        None
    };

    let health_task = tokio::spawn(health::run_reporter(
        Arc::clone(&repository),
        config.sync.clone(),
        shutdown.clone(),
    ));

    // Wait for shutdown signal (SIGINT or SIGTERM); SIGHUP forces an
    // immediate sync round instead.
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())
        .expect("Failed to install SIGTERM handler");
    let mut sighup = tokio::signal::unix::signal(SignalKind::hangup())
        .expect("Failed to install SIGHUP handler");

    loop {
        select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, initiating shutdown...");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
                break;
            }
            _ = sighup.recv() => {
                tracing::info!("Received SIGHUP, requesting sync for all chains");
                for chain_id in &chain_ids {
                    scheduler_handle.request_sync(*chain_id);
                }
            }
        }
    }

    tracing::info!("Shutting down gracefully...");
    shutdown.cancel();

    // The scheduler drains in-flight runs before exiting; each batch commits
    // atomically, so a timeout here cannot corrupt sync state.
    const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
    if let Some(task) = scheduler_task {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(())) => tracing::info!("Sync scheduler shut down cleanly"),
            Ok(Err(e)) => tracing::error!("Sync scheduler task panicked: {:?}", e),
            Err(_) => tracing::warn!("Sync scheduler drain timeout after {:?}", SHUTDOWN_TIMEOUT),
        }
    }

    match tokio::time::timeout(Duration::from_secs(5), health_task).await {
        Ok(Ok(())) => tracing::info!("Health reporter shut down cleanly"),
        Ok(Err(e)) => tracing::error!("Health reporter task panicked: {:?}", e),
        Err(_) => tracing::warn!("Health reporter shutdown timeout"),
    }

    tracing::info!("Shutdown complete");
}
