use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_sync_run(
    chain_id: &str,
    status: &str,
    duration: Duration,
    records_upserted: usize,
    records_skipped: usize,
) {
    histogram!(
        "node_sync_run_duration_seconds",
        "chain_id" => chain_id.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
    counter!(
        "node_sync_records_upserted_total",
        "chain_id" => chain_id.to_string()
    )
    .increment(records_upserted as u64);
    counter!(
        "node_sync_records_skipped_total",
        "chain_id" => chain_id.to_string()
    )
    .increment(records_skipped as u64);
}

pub fn record_sync_cursor(chain_id: &str, block_number: u64) {
    gauge!(
        "node_sync_cursor_block",
        "chain_id" => chain_id.to_string()
    )
    .set(block_number as f64);
}

pub fn record_sync_inflight(inflight: usize) {
    gauge!("node_sync_runs_inflight").set(inflight as f64);
}

pub fn record_sync_chain_health(
    chain_id: &str,
    consecutive_failures: u32,
    seconds_since_success: Option<i64>,
) {
    gauge!(
        "node_sync_consecutive_failures",
        "chain_id" => chain_id.to_string()
    )
    .set(consecutive_failures as f64);
    if let Some(seconds) = seconds_since_success {
        gauge!(
            "node_sync_seconds_since_success",
            "chain_id" => chain_id.to_string()
        )
        .set(seconds as f64);
    }
}
