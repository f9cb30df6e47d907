//! Sync cursor: persists the next block height to resume from.
//!
//! The cursor is a singleton record. Only the sync engine writes it, and only
//! after every event of a cycle has been applied, so a crash or failed cycle
//! leaves it pointing at the range that still needs to be processed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::SyncError;

/// The persisted cursor record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Next block height to query.
    pub last_block: u64,
    /// Unix timestamp of the last write.
    pub updated_at: i64,
}

impl Cursor {
    pub fn new(last_block: u64) -> Self {
        Self {
            last_block,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Trait for loading and saving the cursor.
///
/// Implementations: [`MemoryCursorStore`] and the SQLite backend in
/// `scoreindex-storage`.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the cursor, or `None` on first run.
    async fn load_cursor(&self) -> Result<Option<Cursor>, SyncError>;

    /// Upsert the cursor.
    async fn save_cursor(&self, last_block: u64) -> Result<(), SyncError>;
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

/// In-memory cursor store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryCursorStore {
    cursor: Mutex<Option<Cursor>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `last_block`.
    pub fn starting_at(last_block: u64) -> Self {
        Self {
            cursor: Mutex::new(Some(Cursor::new(last_block))),
        }
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load_cursor(&self) -> Result<Option<Cursor>, SyncError> {
        Ok(self.cursor.lock().unwrap().clone())
    }

    async fn save_cursor(&self, last_block: u64) -> Result<(), SyncError> {
        *self.cursor.lock().unwrap() = Some(Cursor::new(last_block));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_starts_empty() {
        let store = MemoryCursorStore::new();
        assert!(store.load_cursor().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_upserts() {
        let store = MemoryCursorStore::starting_at(100);
        assert_eq!(store.load_cursor().await.unwrap().unwrap().last_block, 100);

        store.save_cursor(111).await.unwrap();
        store.save_cursor(122).await.unwrap();
        assert_eq!(store.load_cursor().await.unwrap().unwrap().last_block, 122);
    }
}
