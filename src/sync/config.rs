use serde::{Deserialize, Serialize};

/// Attestation sync tuning knobs, shared by the per-chain sync runs and the
/// scheduler that dispatches them.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct SyncConfig {
    /// Master switch for the sync scheduler.
    pub enabled: bool,
    /// Seconds between scheduler polling rounds.
    pub poll_interval_secs: u64,
    /// Maximum number of chains synced concurrently.
    pub worker_limit: usize,
    /// Records requested per GraphQL page.
    pub page_size: u32,
    /// Page cap per sync run; a chain far behind catches up across runs.
    pub max_pages_per_run: u32,
    /// Exponential backoff base after a failed run.
    pub retry_base_delay_secs: u64,
    /// Backoff ceiling.
    pub retry_max_delay_secs: u64,
    /// Jitter added to backoff so chains don't retry in lockstep.
    pub retry_jitter_secs: u64,
    /// Per-request timeout for the attestation index.
    pub request_timeout_ms: u64,
    /// Connect timeout for the attestation index.
    pub connect_timeout_ms: u64,
    /// Seconds between health snapshot reports.
    pub health_report_interval_secs: u64,
    /// Consecutive failures before a chain is reported unhealthy.
    pub failure_alert_threshold: u32,
}
