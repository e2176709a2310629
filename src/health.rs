//! Periodic sync health reporting.
//!
//! Surfaces per-chain sync state as metrics and logs so operators can tell a
//! chain that is idle (nothing new to ingest) from one that is stuck
//! (failing repeatedly or silent for too long).

use std::{sync::Arc, time::Duration};

use astral_domain::ChainId;
use astral_repository::{RepositoryManager, SyncStateEntry};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::sync::SyncConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChainHealth {
    pub chain_id: ChainId,
    pub consecutive_failures: u32,
    pub seconds_since_success: Option<i64>,
    pub healthy: bool,
}

/// One health snapshot per chain with recorded sync state.
pub(crate) fn collect(states: &[SyncStateEntry], failure_threshold: u32, now: i64) -> Vec<ChainHealth> {
    states
        .iter()
        .map(|state| {
            let seconds_since_success = state
                .last_sync_success_at
                .map(|success_at| now.saturating_sub(success_at));
            ChainHealth {
                chain_id: state.chain_id,
                consecutive_failures: state.consecutive_failure_count,
                seconds_since_success,
                healthy: state.consecutive_failure_count < failure_threshold,
            }
        })
        .collect()
}

pub(crate) async fn run_reporter(
    repository: Arc<RepositoryManager>,
    config: SyncConfig,
    shutdown: CancellationToken,
) {
    let states = repository.sync_state_repository();
    let interval = Duration::from_secs(config.health_report_interval_secs);

    loop {
        match states.all().await {
            Ok(entries) => {
                let snapshot = collect(&entries, config.failure_alert_threshold, Utc::now().timestamp());
                for chain in &snapshot {
                    astral_observability::record_sync_chain_health(
                        &chain.chain_id.to_string(),
                        chain.consecutive_failures,
                        chain.seconds_since_success,
                    );
                    if !chain.healthy {
                        tracing::warn!(
                            chain_id = %chain.chain_id,
                            consecutive_failures = chain.consecutive_failures,
                            "Chain sync is unhealthy"
                        );
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to read sync state for health report");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("Health reporter shutting down");
                break;
            }
        }
    }
}
