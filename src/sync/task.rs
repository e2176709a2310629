use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use astral_domain::{ChainId, SyncCursor};
use astral_repository::RepositoryManager;
use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::NodeError,
    registry::{ChainHandle, ChainRegistry},
    sync::{SyncConfig, backoff::compute_retry_delay_secs, translator},
};

/// What the scheduler should do with a chain after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Run finished; eligible again next polling round.
    Completed,
    /// Run failed; hold the chain back for this long.
    Backoff(Duration),
}

/// Seam between the scheduler and the sync pipeline, so scheduler tests can
/// run against scripted runners.
#[async_trait]
pub(crate) trait ChainSyncRunner: Send + Sync + 'static {
    /// Sync one chain. The shutdown token is honored between pages only: a
    /// page whose transaction committed is never interrupted.
    async fn run_chain(&self, chain_id: ChainId, shutdown: CancellationToken) -> RunOutcome;
}

/// Per-chain sync pipeline: fetch pages from the chain's attestation index,
/// translate, and persist each page with its cursor in one transaction.
pub(crate) struct SyncTask {
    registry: Arc<ChainRegistry>,
    repository: Arc<RepositoryManager>,
    config: SyncConfig,
}

#[derive(Debug, Default)]
struct RunStats {
    pages: u32,
    upserted: u64,
    skipped: usize,
}

impl SyncTask {
    pub(crate) fn new(
        registry: Arc<ChainRegistry>,
        repository: Arc<RepositoryManager>,
        config: SyncConfig,
    ) -> Self {
        Self {
            registry,
            repository,
            config,
        }
    }

    async fn sync_chain(
        &self,
        handle: &ChainHandle,
        shutdown: &CancellationToken,
    ) -> Result<RunStats, NodeError> {
        let states = self.repository.sync_state_repository();
        let proofs = self.repository.location_proof_repository();

        let mut cursor = states
            .get(handle.chain_id)
            .await?
            .and_then(|state| state.cursor())
            .unwrap_or_else(|| SyncCursor::from_start(handle.deployment_block));

        let mut stats = RunStats::default();

        for _ in 0..self.config.max_pages_per_run {
            if shutdown.is_cancelled() {
                tracing::debug!(
                    chain_id = %handle.chain_id,
                    "Shutdown requested, stopping sync at a page boundary"
                );
                return Ok(stats);
            }

            let page = handle
                .index
                .fetch_since(&handle.schema_uid, &cursor, self.config.page_size)
                .await?;

            if page.records.is_empty() {
                break;
            }

            // One clock per batch so every record in it derives status
            // against the same instant.
            let now = Utc::now().timestamp();
            let mut batch = Vec::with_capacity(page.records.len());
            for record in &page.records {
                match translator::translate(record, handle.chain_id, now) {
                    Ok(proof) => batch.push(proof),
                    Err(error) => {
                        tracing::warn!(
                            chain_id = %handle.chain_id,
                            uid = %record.id,
                            %error,
                            "Skipping untranslatable attestation"
                        );
                        stats.skipped += 1;
                    }
                }
            }

            // Skipped records still advance the cursor: they were fetched and
            // judged, and re-fetching them would fail the same way.
            let next_cursor = page.next_cursor.clone().unwrap_or_else(|| cursor.clone());
            let summary = proofs
                .persist_batch(handle.chain_id, &handle.schema_uid, &batch, &next_cursor)
                .await?;

            stats.upserted += summary.upserted;
            stats.pages += 1;
            astral_observability::record_sync_cursor(
                &handle.chain_id.to_string(),
                next_cursor.block_number,
            );

            let short_page = (page.records.len() as u32) < self.config.page_size;
            cursor = next_cursor;
            if short_page {
                break;
            }
        }

        if stats.pages == 0 {
            // Nothing new, but the attempt succeeded; stamp it so health
            // reporting can tell "idle" from "stuck".
            states.mark_success(handle.chain_id, &handle.schema_uid).await?;
        }

        Ok(stats)
    }
}

#[async_trait]
impl ChainSyncRunner for SyncTask {
    async fn run_chain(&self, chain_id: ChainId, shutdown: CancellationToken) -> RunOutcome {
        let Some(handle) = self.registry.get(chain_id) else {
            tracing::warn!(%chain_id, "Sync requested for unregistered chain");
            return RunOutcome::Completed;
        };

        let started = Instant::now();
        match self.sync_chain(handle, &shutdown).await {
            Ok(stats) => {
                tracing::debug!(
                    chain_id = %chain_id,
                    pages = stats.pages,
                    upserted = stats.upserted,
                    skipped = stats.skipped,
                    "Sync run completed"
                );
                astral_observability::record_sync_run(
                    &chain_id.to_string(),
                    "success",
                    started.elapsed(),
                    stats.upserted as usize,
                    stats.skipped,
                );
                RunOutcome::Completed
            }
            Err(error) => {
                tracing::warn!(chain_id = %chain_id, %error, "Sync run failed");

                let failures = match self
                    .repository
                    .sync_state_repository()
                    .record_failure(chain_id, &handle.schema_uid)
                    .await
                {
                    Ok(failures) => failures,
                    Err(db_error) => {
                        tracing::error!(
                            chain_id = %chain_id,
                            error = %db_error,
                            "Failed to record sync failure"
                        );
                        1
                    }
                };

                astral_observability::record_sync_run(
                    &chain_id.to_string(),
                    "failure",
                    started.elapsed(),
                    0,
                    0,
                );

                let delay = compute_retry_delay_secs(
                    failures,
                    self.config.retry_base_delay_secs,
                    self.config.retry_max_delay_secs,
                    self.config.retry_jitter_secs,
                    chain_id.get(),
                    Utc::now().timestamp(),
                );
                RunOutcome::Backoff(Duration::from_secs(delay))
            }
        }
    }
}
