//! The sync engine: one cursor-tracked ingestion cycle per call.
//!
//! # Cycle
//! 1. Acquire the reentrancy guard (or return [`CycleOutcome::Skipped`]).
//! 2. Read the cursor `C` (default: `start_block`).
//! 3. Fetch events for `[C, C + chunk_size]`.
//! 4. Apply each event to the ledger in chain order.
//! 5. Persist `C + chunk_size + 1`.
//!
//! Any failure in 2–5 returns before the cursor write, so the next cycle
//! retries the same range. Ledger writes already made in a failed cycle are
//! not undone: application is at-least-once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{DecodePolicy, SyncConfig};
use crate::cursor::CursorStore;
use crate::error::SyncError;
use crate::ledger::{Player, PointLedger};
use crate::source::EventSource;
use crate::types::{BlockRange, FetchedEvent, GameFinishedEvent};

/// Points a winner starts with when first seen.
const WINNER_DEFAULT_POINT: u64 = 1;
/// Points a loser starts with when first seen.
const LOSER_DEFAULT_POINT: u64 = 0;

/// What one completed cycle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    /// Range that was queried.
    pub range: BlockRange,
    /// Events applied to the ledger.
    pub events_applied: usize,
    /// Undecodable events skipped under [`DecodePolicy::Skip`].
    pub events_skipped: usize,
    /// Cursor value persisted at the end of the cycle.
    pub next_cursor: u64,
}

/// Result of [`SyncEngine::run_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle held the guard; nothing was read or written.
    Skipped,
    /// The range was applied and the cursor advanced.
    Completed(CycleSummary),
}

/// Held for the duration of a cycle; clears the flag on every exit path.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Turns game-finished events into point-ledger mutations, one bounded block
/// range per cycle.
pub struct SyncEngine<S: EventSource> {
    source: S,
    cursor: Arc<dyn CursorStore>,
    ledger: Arc<dyn PointLedger>,
    start_block: u64,
    chunk_size: u64,
    decode_policy: DecodePolicy,
    running: AtomicBool,
}

impl<S: EventSource> SyncEngine<S> {
    pub fn new(
        source: S,
        cursor: Arc<dyn CursorStore>,
        ledger: Arc<dyn PointLedger>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            source,
            cursor,
            ledger,
            start_block: config.start_block,
            chunk_size: config.chunk_size,
            decode_policy: config.decode_policy,
            running: AtomicBool::new(false),
        }
    }

    /// Returns `true` while a cycle holds the guard.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one ingestion cycle.
    ///
    /// Returns [`CycleOutcome::Skipped`] without touching any store if a cycle
    /// is already in progress on this engine.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, SyncError> {
        let Some(_guard) = CycleGuard::try_acquire(&self.running) else {
            debug!("sync cycle already in progress, skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let cursor = match self.current_cursor().await {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, retryable = e.is_retryable(), "failed to read cursor");
                return Err(e);
            }
        };
        let range = BlockRange::chunk(cursor, self.chunk_size);
        debug!(from = range.from, to = range.to, "sync cycle start");

        match self.sync_range(range).await {
            Ok(summary) => Ok(CycleOutcome::Completed(summary)),
            Err(e) => {
                error!(
                    from = range.from,
                    to = range.to,
                    error = %e,
                    retryable = e.is_retryable(),
                    "sync cycle failed, cursor not advanced"
                );
                Err(e)
            }
        }
    }

    async fn current_cursor(&self) -> Result<u64, SyncError> {
        Ok(self
            .cursor
            .load_cursor()
            .await?
            .map(|c| c.last_block)
            .unwrap_or(self.start_block))
    }

    async fn sync_range(&self, range: BlockRange) -> Result<CycleSummary, SyncError> {
        let fetched = self.source.fetch_events(range).await?;
        let (events, skipped) = self.screen(fetched)?;

        if !events.is_empty() {
            info!(
                from = range.from,
                to = range.to,
                events = events.len(),
                "found finished games"
            );
        }

        for event in &events {
            self.apply(event).await?;
        }

        let next_cursor = range.next_cursor();
        self.cursor.save_cursor(next_cursor).await?;

        debug!(next_cursor, applied = events.len(), skipped, "sync cycle complete");
        Ok(CycleSummary {
            range,
            events_applied: events.len(),
            events_skipped: skipped,
            next_cursor,
        })
    }

    /// Apply the decode policy to a fetched batch before any ledger write.
    fn screen(
        &self,
        fetched: Vec<FetchedEvent>,
    ) -> Result<(Vec<GameFinishedEvent>, usize), SyncError> {
        let mut events = Vec::with_capacity(fetched.len());
        let mut skipped = 0;
        for item in fetched {
            match item {
                Ok(event) => events.push(event),
                Err(failure) => match self.decode_policy {
                    DecodePolicy::Skip => {
                        warn!(
                            block = failure.block_number,
                            reason = %failure.reason,
                            "skipping undecodable event"
                        );
                        skipped += 1;
                    }
                    DecodePolicy::Abort => {
                        return Err(SyncError::Decode {
                            block_number: failure.block_number,
                            reason: failure.reason,
                        })
                    }
                },
            }
        }
        Ok((events, skipped))
    }

    async fn apply(&self, event: &GameFinishedEvent) -> Result<(), SyncError> {
        let winner = self.settle(&event.winner, WINNER_DEFAULT_POINT, 1).await?;
        let loser = self.settle(&event.loser, LOSER_DEFAULT_POINT, -1).await?;
        debug!(
            game_id = %event.game_id,
            block = event.block_number,
            winner = %winner.address,
            winner_point = winner.point,
            loser = %loser.address,
            loser_point = loser.point,
            "game applied"
        );
        Ok(())
    }

    /// Create the player with `default_point`, or shift an existing total by `delta`.
    async fn settle(
        &self,
        address: &str,
        default_point: u64,
        delta: i64,
    ) -> Result<Player, SyncError> {
        let upserted = self.ledger.upsert_player(address, default_point).await?;
        if upserted.created {
            return Ok(upserted.player);
        }
        self.ledger.increment_point(address, delta).await
    }
}
