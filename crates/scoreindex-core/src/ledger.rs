//! Point ledger: per-player point totals keyed by normalized address.
//!
//! Points never go negative: every backend floors decrements at zero
//! ([`apply_delta`] in memory, `MAX(point + delta, 0)` in SQL).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SyncError;

/// A leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Normalized address (unique key).
    pub address: String,
    /// Point total, never below zero.
    pub point: u64,
    /// Display name; defaults to the address on creation.
    pub username: Option<String>,
}

impl Player {
    pub fn new(address: impl Into<String>, point: u64) -> Self {
        let address = address.into();
        Self {
            username: Some(address.clone()),
            address,
            point,
        }
    }
}

/// Result of [`PointLedger::upsert_player`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub player: Player,
    /// `true` if the record did not exist and was created with the default.
    pub created: bool,
}

/// Add `delta` to `point`, flooring at zero.
pub fn apply_delta(point: u64, delta: i64) -> u64 {
    if delta >= 0 {
        point.saturating_add(delta as u64)
    } else {
        point.saturating_sub(delta.unsigned_abs())
    }
}

/// Persistence contract for player point totals.
///
/// Every method is a single-record operation; none of them is transactional
/// with the cursor.
#[async_trait]
pub trait PointLedger: Send + Sync {
    /// Return the player at `address`, creating it with `default_point` if absent.
    async fn upsert_player(&self, address: &str, default_point: u64)
        -> Result<Upserted, SyncError>;

    /// Add `delta` to the player's total (floored at zero) and return the new record.
    ///
    /// Fails with [`SyncError::Store`] if the player does not exist.
    async fn increment_point(&self, address: &str, delta: i64) -> Result<Player, SyncError>;

    /// Look up a player without creating it.
    async fn get_player(&self, address: &str) -> Result<Option<Player>, SyncError>;

    /// The `limit` highest totals, ties broken by address.
    async fn top_players(&self, limit: usize) -> Result<Vec<Player>, SyncError>;

    /// Return the player at `address`, creating it with zero points if absent.
    async fn get_or_create_player(&self, address: &str) -> Result<Player, SyncError> {
        Ok(self.upsert_player(address, 0).await?.player)
    }
}

// ─── In-memory ledger (for testing) ──────────────────────────────────────────

/// In-memory point ledger for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryPointLedger {
    players: Mutex<HashMap<String, Player>>,
}

impl MemoryPointLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a player record directly.
    pub fn insert(&self, player: Player) {
        self.players
            .lock()
            .unwrap()
            .insert(player.address.clone(), player);
    }

    /// Number of player records.
    pub fn len(&self) -> usize {
        self.players.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point total for `address`, if the player exists.
    pub fn point_of(&self, address: &str) -> Option<u64> {
        self.players.lock().unwrap().get(address).map(|p| p.point)
    }
}

#[async_trait]
impl PointLedger for MemoryPointLedger {
    async fn upsert_player(
        &self,
        address: &str,
        default_point: u64,
    ) -> Result<Upserted, SyncError> {
        let mut players = self.players.lock().unwrap();
        if let Some(existing) = players.get(address) {
            return Ok(Upserted {
                player: existing.clone(),
                created: false,
            });
        }
        let player = Player::new(address, default_point);
        players.insert(address.to_string(), player.clone());
        Ok(Upserted {
            player,
            created: true,
        })
    }

    async fn increment_point(&self, address: &str, delta: i64) -> Result<Player, SyncError> {
        let mut players = self.players.lock().unwrap();
        let player = players
            .get_mut(address)
            .ok_or_else(|| SyncError::Store(format!("player {address} not found")))?;
        player.point = apply_delta(player.point, delta);
        Ok(player.clone())
    }

    async fn get_player(&self, address: &str) -> Result<Option<Player>, SyncError> {
        Ok(self.players.lock().unwrap().get(address).cloned())
    }

    async fn top_players(&self, limit: usize) -> Result<Vec<Player>, SyncError> {
        let mut players: Vec<Player> = self.players.lock().unwrap().values().cloned().collect();
        players.sort_by(|a, b| b.point.cmp(&a.point).then_with(|| a.address.cmp(&b.address)));
        players.truncate(limit);
        Ok(players)
    }
}
