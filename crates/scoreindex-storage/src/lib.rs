//! scoreindex-storage: persistent backends for the sync cursor and point ledger.
//!
//! Backends:
//! - [`sqlite`]: SQLite via `sqlx` (embedded, single-file persistence)
//!
//! In-memory stores for tests live in `scoreindex-core`.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
