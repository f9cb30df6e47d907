//! `starknet_getEvents` response types and game-finished decoding.

use serde::{Deserialize, Serialize};

use scoreindex_core::address::normalize_address;
use scoreindex_core::error::SyncError;
use scoreindex_core::types::{DecodeFailure, GameFinishedEvent};

/// Positions of the game-finished fields inside `data`.
const GAME_ID_INDEX: usize = 1;
const WINNER_INDEX: usize = 3;
const LOSER_INDEX: usize = 5;

/// A raw emitted event as returned by `starknet_getEvents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub from_address: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub data: Vec<String>,
    /// Absent for events from the pending block.
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// One page of `starknet_getEvents` results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsPage {
    pub events: Vec<EmittedEvent>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// Map an emitted event's positional data to a [`GameFinishedEvent`].
///
/// `data[1]` is the game id, `data[3]` the winner and `data[5]` the loser;
/// both addresses are normalized.
pub fn decode_game_finished(raw: &EmittedEvent) -> Result<GameFinishedEvent, DecodeFailure> {
    let block_number = raw.block_number.unwrap_or_default();
    let field = |index: usize, name: &str| {
        raw.data.get(index).ok_or_else(|| DecodeFailure {
            block_number,
            reason: format!(
                "data has {} fields, {name} expected at index {index}",
                raw.data.len()
            ),
        })
    };
    let address = |index: usize, name: &str| {
        let value = field(index, name)?;
        normalize_address(value).map_err(|e| DecodeFailure {
            block_number,
            reason: match e {
                SyncError::Decode { reason, .. } => format!("{name}: {reason}"),
                other => format!("{name}: {other}"),
            },
        })
    };

    Ok(GameFinishedEvent {
        game_id: field(GAME_ID_INDEX, "game id")?.clone(),
        winner: address(WINNER_INDEX, "winner")?,
        loser: address(LOSER_INDEX, "loser")?,
        block_number,
    })
}
