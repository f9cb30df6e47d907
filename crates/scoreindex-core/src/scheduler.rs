//! Fixed-interval trigger for the sync engine.
//!
//! Every tick spawns `run_cycle` on its own task, so a slow cycle never delays
//! the timer. Overlap is resolved by the engine's guard: a tick that lands
//! while a cycle is running becomes a no-op, and missed ticks are not queued.
//! Spawned cycles are tracked in a [`JoinSet`] and drained on shutdown, so
//! `run` only returns once no cycle is writing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::engine::{CycleOutcome, SyncEngine};
use crate::source::EventSource;

/// Drives a [`SyncEngine`] on a fixed period until shut down.
pub struct Scheduler<S: EventSource + 'static> {
    engine: Arc<SyncEngine<S>>,
    period: Duration,
}

impl<S: EventSource + 'static> Scheduler<S> {
    pub fn new(engine: Arc<SyncEngine<S>>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Tick until `shutdown` becomes `true` (or its sender is dropped), then
    /// wait for in-flight cycles to finish.
    ///
    /// The first tick fires immediately. Returns the number of ticks fired.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = self.period.as_secs_f64(), "scheduler started");

        let mut cycles = JoinSet::new();
        let mut ticks = 0u64;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    ticks += 1;
                    if self.engine.is_running() {
                        debug!("tick dropped, cycle in progress");
                        continue;
                    }
                    let engine = Arc::clone(&self.engine);
                    cycles.spawn(async move {
                        // Failures are logged by the engine with their block range.
                        match engine.run_cycle().await {
                            Ok(CycleOutcome::Skipped) => debug!("tick dropped, cycle in progress"),
                            Ok(CycleOutcome::Completed(summary)) => debug!(
                                next_cursor = summary.next_cursor,
                                applied = summary.events_applied,
                                "tick complete"
                            ),
                            Err(_) => {}
                        }
                    });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    reap(joined);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if !cycles.is_empty() {
            info!(in_flight = cycles.len(), "waiting for running cycle");
        }
        while let Some(joined) = cycles.join_next().await {
            reap(joined);
        }

        info!(ticks, "scheduler stopped");
        ticks
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "sync cycle panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::cursor::{CursorStore, MemoryCursorStore};
    use crate::error::SyncError;
    use crate::ledger::MemoryPointLedger;
    use crate::types::{BlockRange, FetchedEvent};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and takes `delay` per fetch.
    struct SlowSource {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl EventSource for SlowSource {
        async fn fetch_events(&self, _range: BlockRange) -> Result<Vec<FetchedEvent>, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec![])
        }
    }

    /// Panics on every fetch.
    struct PanickingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventSource for PanickingSource {
        async fn fetch_events(&self, _range: BlockRange) -> Result<Vec<FetchedEvent>, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("node returned garbage");
        }
    }

    fn engine(
        calls: Arc<AtomicUsize>,
        delay: Duration,
        cursor: Arc<MemoryCursorStore>,
    ) -> Arc<SyncEngine<SlowSource>> {
        Arc::new(SyncEngine::new(
            SlowSource { calls, delay },
            cursor,
            Arc::new(MemoryPointLedger::new()),
            &SyncConfig::default(),
        ))
    }

    #[tokio::test]
    async fn stops_on_shutdown_signal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Arc::new(MemoryCursorStore::new());
        let scheduler = Scheduler::new(
            engine(calls.clone(), Duration::ZERO, cursor.clone()),
            Duration::from_millis(20),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(110)).await;
        tx.send(true).unwrap();
        let ticks = handle.await.unwrap();

        assert!(ticks >= 2, "ticks = {ticks}");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(cursor.load_cursor().await.unwrap().unwrap().last_block > 0);
    }

    #[tokio::test]
    async fn slow_cycles_drop_overlapping_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Arc::new(MemoryCursorStore::new());
        // Each cycle outlives ~5 ticks.
        let scheduler = Scheduler::new(
            engine(calls.clone(), Duration::from_millis(100), cursor.clone()),
            Duration::from_millis(20),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(230)).await;
        drop(tx);
        let ticks = handle.await.unwrap();

        let fetched = calls.load(Ordering::SeqCst) as u64;
        assert!(ticks > fetched, "ticks = {ticks}, fetched = {fetched}");
        assert!(fetched <= 3, "fetched = {fetched}");
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_cycle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cursor = Arc::new(MemoryCursorStore::new());
        let scheduler = Scheduler::new(
            engine(calls.clone(), Duration::from_millis(80), cursor.clone()),
            Duration::from_secs(60),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        // First tick is mid-fetch when shutdown arrives.
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        let ticks = handle.await.unwrap();

        assert_eq!(ticks, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cursor.load_cursor().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn panicking_cycle_does_not_stop_scheduler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = Arc::new(SyncEngine::new(
            PanickingSource {
                calls: calls.clone(),
            },
            Arc::new(MemoryCursorStore::new()),
            Arc::new(MemoryPointLedger::new()),
            &SyncConfig::default(),
        ));
        let scheduler = Scheduler::new(Arc::clone(&engine), Duration::from_millis(20));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler.run(rx));
        tokio::time::sleep(Duration::from_millis(110)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // The guard is released on unwind, so later ticks still run.
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(!engine.is_running());
    }
}
