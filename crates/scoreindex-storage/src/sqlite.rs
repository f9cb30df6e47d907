//! SQLite storage backend for scoreindex.
//!
//! Persists the sync cursor and the player point ledger to a single SQLite
//! file. Uses `sqlx` with WAL mode so leaderboard reads don't block the sync.
//!
//! # Usage
//! ```rust,no_run
//! use scoreindex_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./scoreindex.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use tracing::debug;

use scoreindex_core::cursor::{Cursor, CursorStore};
use scoreindex_core::error::SyncError;
use scoreindex_core::ledger::{Player, PointLedger, Upserted};

/// Primary key of the single `sync_status` row.
const SYNC_STATUS_ID: i64 = 1;

/// SQLite-backed cursor store and point ledger.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./scoreindex.db"`) or a full
    /// SQLite URL (`"sqlite:./scoreindex.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, SyncError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(store_err)?;
        let storage = Self { pool };
        storage.init_schema().await?;
        debug!(%url, "sqlite storage opened");
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Every pooled connection would see its own empty database, so the pool
    /// is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, SyncError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await
            .map_err(store_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), SyncError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sync_status (
                id          INTEGER PRIMARY KEY CHECK (id = 1),
                last_block  INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS players (
                address     TEXT    PRIMARY KEY,
                point       INTEGER NOT NULL DEFAULT 0 CHECK (point >= 0),
                username    TEXT,
                created_at  INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_players_point ON players (point DESC);")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(())
    }

    /// Number of players on the ledger.
    pub async fn player_count(&self) -> Result<u64, SyncError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM players")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }

    async fn fetch_player(&self, address: &str) -> Result<Option<Player>, SyncError> {
        let row = sqlx::query("SELECT address, point, username FROM players WHERE address = ?")
            .bind(address)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.as_ref().map(player_from_row))
    }
}

fn store_err(e: sqlx::Error) -> SyncError {
    SyncError::Store(e.to_string())
}

fn player_from_row(row: &SqliteRow) -> Player {
    Player {
        address: row.get("address"),
        point: row.get::<i64, _>("point").max(0) as u64,
        username: row.get("username"),
    }
}

// ─── CursorStore impl ────────────────────────────────────────────────────────

#[async_trait]
impl CursorStore for SqliteStorage {
    async fn load_cursor(&self) -> Result<Option<Cursor>, SyncError> {
        let row = sqlx::query("SELECT last_block, updated_at FROM sync_status WHERE id = ?")
            .bind(SYNC_STATUS_ID)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(row.map(|r| Cursor {
            last_block: r.get::<i64, _>("last_block") as u64,
            updated_at: r.get("updated_at"),
        }))
    }

    async fn save_cursor(&self, last_block: u64) -> Result<(), SyncError> {
        let cursor = Cursor::new(last_block);
        sqlx::query(
            "INSERT INTO sync_status (id, last_block, updated_at) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                last_block = excluded.last_block,
                updated_at = excluded.updated_at",
        )
        .bind(SYNC_STATUS_ID)
        .bind(cursor.last_block as i64)
        .bind(cursor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        debug!(last_block, "cursor saved");
        Ok(())
    }
}

// ─── PointLedger impl ────────────────────────────────────────────────────────

#[async_trait]
impl PointLedger for SqliteStorage {
    async fn upsert_player(
        &self,
        address: &str,
        default_point: u64,
    ) -> Result<Upserted, SyncError> {
        let now = chrono::Utc::now().timestamp();
        let inserted = sqlx::query(
            "INSERT INTO players (address, point, username, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (address) DO NOTHING",
        )
        .bind(address)
        .bind(default_point.min(i64::MAX as u64) as i64)
        .bind(address)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?
        .rows_affected();

        let player = self
            .fetch_player(address)
            .await?
            .ok_or_else(|| SyncError::Store(format!("player {address} vanished after upsert")))?;

        if inserted > 0 {
            debug!(address, point = player.point, "player created");
        }
        Ok(Upserted {
            player,
            created: inserted > 0,
        })
    }

    async fn increment_point(&self, address: &str, delta: i64) -> Result<Player, SyncError> {
        let updated = sqlx::query(
            "UPDATE players SET point = MAX(point + ?, 0), updated_at = ? WHERE address = ?",
        )
        .bind(delta)
        .bind(chrono::Utc::now().timestamp())
        .bind(address)
        .execute(&self.pool)
        .await
        .map_err(store_err)?
        .rows_affected();

        if updated == 0 {
            return Err(SyncError::Store(format!("no player with address {address}")));
        }
        self.fetch_player(address)
            .await?
            .ok_or_else(|| SyncError::Store(format!("player {address} vanished after update")))
    }

    async fn get_player(&self, address: &str) -> Result<Option<Player>, SyncError> {
        self.fetch_player(address).await
    }

    async fn top_players(&self, limit: usize) -> Result<Vec<Player>, SyncError> {
        let rows = sqlx::query(
            "SELECT address, point, username FROM players
             ORDER BY point DESC, address ASC LIMIT ?",
        )
        .bind(limit.min(i64::MAX as usize) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.iter().map(player_from_row).collect())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
