//! scoreindex-core: cursor-tracked leaderboard sync for on-chain game results.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (fixed interval, non-overlapping)
//!     └── SyncEngine::run_cycle
//!             ├── CursorStore   (next block to process)
//!             ├── EventSource   (game-finished events for [C, C + chunk])
//!             └── PointLedger   (per-player point totals)
//! ```

pub mod address;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod scheduler;
pub mod source;
pub mod types;

pub use address::normalize_address;
pub use config::{DecodePolicy, SyncConfig};
pub use cursor::{Cursor, CursorStore, MemoryCursorStore};
pub use engine::{CycleOutcome, CycleSummary, SyncEngine};
pub use error::SyncError;
pub use ledger::{apply_delta, MemoryPointLedger, Player, PointLedger, Upserted};
pub use scheduler::Scheduler;
pub use source::EventSource;
pub use types::{BlockRange, DecodeFailure, EventKeys, FetchedEvent, GameFinishedEvent};
