/// Exponential retry backoff for a chain with `consecutive_failures` failed
/// runs in a row.
///
/// The jitter is deterministic, seeded from the chain id and the clock, so
/// chains failing against the same upstream don't retry in lockstep.
pub(crate) fn compute_retry_delay_secs(
    consecutive_failures: u32,
    retry_base_delay_secs: u64,
    retry_max_delay_secs: u64,
    retry_jitter_secs: u64,
    chain_id: u64,
    now_ts: i64,
) -> u64 {
    let base = retry_base_delay_secs.max(1);
    let max = retry_max_delay_secs.max(base);

    let shift = consecutive_failures.saturating_sub(1).min(31);
    let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
    let backoff = base.saturating_mul(multiplier).min(max);

    let available_jitter = max.saturating_sub(backoff);
    let jitter_limit = retry_jitter_secs.min(available_jitter);
    if jitter_limit == 0 {
        return backoff;
    }

    let seed = chain_id
        .wrapping_mul(1_103_515_245)
        .wrapping_add((now_ts as u64).wrapping_mul(12_345));
    let jitter = seed % (jitter_limit.saturating_add(1));
    backoff.saturating_add(jitter)
}
