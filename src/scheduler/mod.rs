//! Dispatches per-chain sync runs.
//!
//! One scheduler owns the whole picture: which chains exist, which are
//! currently running, and which are held back by retry backoff. Runs are
//! spawned onto a `JoinSet` behind a semaphore, so at most `worker_limit`
//! chains sync concurrently and a chain is never synced by two runs at once.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use astral_domain::ChainId;
use tokio::{
    sync::{Semaphore, mpsc},
    task::{Id as TaskId, JoinSet},
    time::{Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::sync::{ChainSyncRunner, RunOutcome, SyncConfig};

/// Cheap handle for requesting an on-demand sync of one chain.
#[derive(Clone)]
pub(crate) struct SchedulerHandle {
    trigger_tx: mpsc::Sender<ChainId>,
}

impl SchedulerHandle {
    /// Ask for a sync run outside the polling rhythm. Lossy by design: if the
    /// queue is full the next polling round covers the chain anyway.
    pub(crate) fn request_sync(&self, chain_id: ChainId) {
        if let Err(error) = self.trigger_tx.try_send(chain_id) {
            tracing::debug!(%chain_id, %error, "Sync trigger dropped");
        }
    }
}

pub(crate) struct SyncScheduler<R: ChainSyncRunner> {
    runner: Arc<R>,
    chains: Vec<ChainId>,
    config: SyncConfig,
    trigger_rx: mpsc::Receiver<ChainId>,
}

impl<R: ChainSyncRunner> SyncScheduler<R> {
    pub(crate) fn new(
        runner: Arc<R>,
        chains: Vec<ChainId>,
        config: SyncConfig,
    ) -> (Self, SchedulerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(64);
        (
            Self {
                runner,
                chains,
                config,
                trigger_rx,
            },
            SchedulerHandle { trigger_tx },
        )
    }

    pub(crate) async fn run(self, shutdown: CancellationToken) {
        let Self {
            runner,
            chains,
            config,
            mut trigger_rx,
        } = self;

        let mut in_flight: HashSet<ChainId> = HashSet::new();
        let mut held_until: HashMap<ChainId, Instant> = HashMap::new();
        let mut runs: JoinSet<(ChainId, RunOutcome)> = JoinSet::new();
        // Task-to-chain attribution, so a panicked run releases exactly its
        // own chain.
        let mut task_chains: HashMap<TaskId, ChainId> = HashMap::new();
        let semaphore = Arc::new(Semaphore::new(config.worker_limit.max(1)));

        let mut poll = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Sync scheduler shutting down");
                    break;
                }
                _ = poll.tick() => {
                    for chain_id in &chains {
                        Self::dispatch(
                            &runner,
                            *chain_id,
                            false,
                            &shutdown,
                            &mut in_flight,
                            &mut held_until,
                            &mut runs,
                            &mut task_chains,
                            &semaphore,
                        );
                    }
                }
                Some(chain_id) = trigger_rx.recv() => {
                    // An explicit request overrides the backoff hold, but
                    // never the single-run-per-chain rule.
                    Self::dispatch(
                        &runner,
                        chain_id,
                        true,
                        &shutdown,
                        &mut in_flight,
                        &mut held_until,
                        &mut runs,
                        &mut task_chains,
                        &semaphore,
                    );
                }
                Some(finished) = runs.join_next_with_id(), if !runs.is_empty() => {
                    match finished {
                        Ok((task_id, (chain_id, outcome))) => {
                            task_chains.remove(&task_id);
                            in_flight.remove(&chain_id);
                            if let RunOutcome::Backoff(delay) = outcome {
                                tracing::info!(
                                    %chain_id,
                                    delay_secs = delay.as_secs(),
                                    "Holding chain back after failed run"
                                );
                                held_until.insert(chain_id, Instant::now() + delay);
                            } else {
                                held_until.remove(&chain_id);
                            }
                        }
                        Err(error) => {
                            // Release only the crashed chain; everything else
                            // keeps its in-flight slot. Treat the crash like a
                            // failed run so it does not retry every tick.
                            if let Some(chain_id) = task_chains.remove(&error.id()) {
                                tracing::error!(%chain_id, %error, "Sync run panicked");
                                in_flight.remove(&chain_id);
                                held_until.insert(
                                    chain_id,
                                    Instant::now()
                                        + Duration::from_secs(config.retry_base_delay_secs.max(1)),
                                );
                            } else {
                                tracing::error!(%error, "Sync run panicked for unknown chain");
                            }
                        }
                    }
                    astral_observability::record_sync_inflight(in_flight.len());
                }
            }
        }

        // Let in-flight runs finish; each batch commits atomically, so
        // stopping after the current page loses nothing.
        while runs.join_next().await.is_some() {}
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch(
        runner: &Arc<R>,
        chain_id: ChainId,
        ignore_hold: bool,
        shutdown: &CancellationToken,
        in_flight: &mut HashSet<ChainId>,
        held_until: &mut HashMap<ChainId, Instant>,
        runs: &mut JoinSet<(ChainId, RunOutcome)>,
        task_chains: &mut HashMap<TaskId, ChainId>,
        semaphore: &Arc<Semaphore>,
    ) {
        if in_flight.contains(&chain_id) {
            tracing::trace!(%chain_id, "Sync already in flight, skipping");
            return;
        }

        if !ignore_hold {
            if let Some(eligible_at) = held_until.get(&chain_id) {
                if *eligible_at > Instant::now() {
                    tracing::trace!(%chain_id, "Chain held back by retry backoff");
                    return;
                }
            }
        }

        let Ok(permit) = Arc::clone(semaphore).try_acquire_owned() else {
            tracing::debug!(%chain_id, "Sync worker limit reached, deferring");
            return;
        };

        in_flight.insert(chain_id);
        astral_observability::record_sync_inflight(in_flight.len());

        let runner = Arc::clone(runner);
        let shutdown = shutdown.clone();
        let handle = runs.spawn(async move {
            let outcome = runner.run_chain(chain_id, shutdown).await;
            drop(permit);
            (chain_id, outcome)
        });
        task_chains.insert(handle.id(), chain_id);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct ScriptedRunner {
        runs: Mutex<Vec<ChainId>>,
        outcome: RunOutcome,
        hold: Duration,
    }

    impl ScriptedRunner {
        fn new(outcome: RunOutcome, hold: Duration) -> Arc<Self> {
            Arc::new(Self {
                runs: Mutex::new(Vec::new()),
                outcome,
                hold,
            })
        }

        fn runs_for(&self, chain_id: ChainId) -> usize {
            self.runs
                .lock()
                .unwrap()
                .iter()
                .filter(|id| **id == chain_id)
                .count()
        }
    }

    #[async_trait]
    impl ChainSyncRunner for ScriptedRunner {
        async fn run_chain(&self, chain_id: ChainId, _shutdown: CancellationToken) -> RunOutcome {
            self.runs.lock().unwrap().push(chain_id);
            tokio::time::sleep(self.hold).await;
            self.outcome
        }
    }

    /// Runner whose designated chain panics on every run; other chains hold.
    struct PanickyRunner {
        runs: Mutex<Vec<ChainId>>,
        crashing: ChainId,
        hold: Duration,
    }

    impl PanickyRunner {
        fn runs_for(&self, chain_id: ChainId) -> usize {
            self.runs
                .lock()
                .unwrap()
                .iter()
                .filter(|id| **id == chain_id)
                .count()
        }
    }

    #[async_trait]
    impl ChainSyncRunner for PanickyRunner {
        async fn run_chain(&self, chain_id: ChainId, _shutdown: CancellationToken) -> RunOutcome {
            self.runs.lock().unwrap().push(chain_id);
            if chain_id == self.crashing {
                panic!("simulated crash");
            }
            tokio::time::sleep(self.hold).await;
            RunOutcome::Completed
        }
    }

    fn config(poll_interval_secs: u64, worker_limit: usize) -> SyncConfig {
        SyncConfig {
            enabled: true,
            poll_interval_secs,
            worker_limit,
            page_size: 100,
            max_pages_per_run: 10,
            retry_base_delay_secs: 5,
            retry_max_delay_secs: 300,
            retry_jitter_secs: 0,
            request_timeout_ms: 1000,
            connect_timeout_ms: 1000,
            health_report_interval_secs: 60,
            failure_alert_threshold: 5,
        }
    }

    const CHAIN_A: u64 = 1;
    const CHAIN_B: u64 = 42220;

    #[tokio::test(start_paused = true)]
    async fn polls_every_chain_each_round() {
        let runner = ScriptedRunner::new(RunOutcome::Completed, Duration::ZERO);
        let (scheduler, _handle) = SyncScheduler::new(
            Arc::clone(&runner),
            vec![ChainId::from(CHAIN_A), ChainId::from(CHAIN_B)],
            config(60, 4),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(shutdown.clone()));

        // First round fires immediately, second at the 60s mark.
        tokio::time::sleep(Duration::from_secs(65)).await;
        shutdown.cancel();
        task.await.unwrap();

        assert_eq!(runner.runs_for(ChainId::from(CHAIN_A)), 2);
        assert_eq!(runner.runs_for(ChainId::from(CHAIN_B)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn a_chain_never_has_two_runs_in_flight() {
        // Runs outlast several polling rounds.
        let runner = ScriptedRunner::new(RunOutcome::Completed, Duration::from_secs(600));
        let (scheduler, _handle) = SyncScheduler::new(
            Arc::clone(&runner),
            vec![ChainId::from(CHAIN_A)],
            config(60, 4),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(200)).await;

        assert_eq!(runner.runs_for(ChainId::from(CHAIN_A)), 1);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_dispatches_without_waiting_for_the_poll() {
        let runner = ScriptedRunner::new(RunOutcome::Completed, Duration::ZERO);
        let (scheduler, handle) = SyncScheduler::new(
            Arc::clone(&runner),
            vec![ChainId::from(CHAIN_A)],
            config(3600, 4),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(shutdown.clone()));

        // Startup round.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runner.runs_for(ChainId::from(CHAIN_A)), 1);

        handle.request_sync(ChainId::from(CHAIN_A));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runner.runs_for(ChainId::from(CHAIN_A)), 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_holds_the_chain_until_the_delay_elapses() {
        let runner =
            ScriptedRunner::new(RunOutcome::Backoff(Duration::from_secs(100)), Duration::ZERO);
        let (scheduler, _handle) = SyncScheduler::new(
            Arc::clone(&runner),
            vec![ChainId::from(CHAIN_A)],
            config(60, 4),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(shutdown.clone()));

        // Run at t=0; the t=60 poll is gated by the 100s hold.
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(runner.runs_for(ChainId::from(CHAIN_A)), 1);

        // The t=120 poll is past the hold.
        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(runner.runs_for(ChainId::from(CHAIN_A)), 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn a_panicking_run_releases_only_its_own_chain() {
        let runner = Arc::new(PanickyRunner {
            runs: Mutex::new(Vec::new()),
            crashing: ChainId::from(CHAIN_A),
            hold: Duration::from_secs(600),
        });
        let (scheduler, _handle) = SyncScheduler::new(
            Arc::clone(&runner),
            vec![ChainId::from(CHAIN_A), ChainId::from(CHAIN_B)],
            config(60, 4),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(130)).await;

        // Chain B's long run is still in flight and was never re-dispatched.
        assert_eq!(runner.runs_for(ChainId::from(CHAIN_B)), 1);
        // The crashed chain got a backoff hold, then became eligible again.
        assert!(runner.runs_for(ChainId::from(CHAIN_A)) >= 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn worker_limit_caps_concurrent_runs() {
        let runner = ScriptedRunner::new(RunOutcome::Completed, Duration::from_secs(600));
        let (scheduler, _handle) = SyncScheduler::new(
            Arc::clone(&runner),
            vec![ChainId::from(CHAIN_A), ChainId::from(CHAIN_B)],
            config(60, 1),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(10)).await;

        let total = runner.runs_for(ChainId::from(CHAIN_A))
            + runner.runs_for(ChainId::from(CHAIN_B));
        assert_eq!(total, 1);

        shutdown.cancel();
        task.await.unwrap();
    }
}
