//! Shared types for the sync pipeline.

use serde::{Deserialize, Serialize};

// ─── BlockRange ───────────────────────────────────────────────────────────────

/// An inclusive block-height range queried in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block (inclusive).
    pub from: u64,
    /// Last block (inclusive).
    pub to: u64,
}

impl BlockRange {
    /// The chunk that starts at `cursor`: `[cursor, cursor + size]`.
    pub fn chunk(cursor: u64, size: u64) -> Self {
        Self {
            from: cursor,
            to: cursor.saturating_add(size),
        }
    }

    /// Cursor value to persist once this range has been fully applied.
    ///
    /// Saturates at `u64::MAX`: a range ending there yields the same cursor,
    /// so the cursor stops advancing at that height.
    pub fn next_cursor(&self) -> u64 {
        self.to.saturating_add(1)
    }
}

impl std::fmt::Display for BlockRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// One finished match, decoded from a single chain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFinishedEvent {
    /// Game identifier as emitted by the contract (felt hex).
    pub game_id: String,
    /// Normalized winner address.
    pub winner: String,
    /// Normalized loser address.
    pub loser: String,
    /// Block that emitted the event.
    pub block_number: u64,
}

/// A raw event that could not be turned into a [`GameFinishedEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub block_number: u64,
    pub reason: String,
}

/// One entry of an event-source result, in chain order.
pub type FetchedEvent = Result<GameFinishedEvent, DecodeFailure>;

// ─── EventKeys ────────────────────────────────────────────────────────────────

/// The two key filters every fetched event must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventKeys {
    /// Event-category selector (`keys[0]`).
    pub event_key: String,
    /// Game-finished type hash (`keys[1]`).
    pub game_finished_key: String,
}

impl EventKeys {
    /// Key filter in the nested form expected by `starknet_getEvents`.
    pub fn as_filter(&self) -> Vec<Vec<String>> {
        vec![
            vec![self.event_key.clone()],
            vec![self.game_finished_key.clone()],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_is_inclusive_of_both_ends() {
        let range = BlockRange::chunk(100, 10);
        assert_eq!(range, BlockRange { from: 100, to: 110 });
        assert_eq!(range.next_cursor(), 111);
    }

    #[test]
    fn chunk_saturates_at_u64_max() {
        let range = BlockRange::chunk(u64::MAX - 1, 10);
        assert_eq!(range.to, u64::MAX);
        assert_eq!(range.next_cursor(), u64::MAX);
    }

    #[test]
    fn range_display() {
        assert_eq!(BlockRange { from: 5, to: 15 }.to_string(), "[5, 15]");
    }

    #[test]
    fn keys_filter_shape() {
        let keys = EventKeys {
            event_key: "0x1".into(),
            game_finished_key: "0x2".into(),
        };
        assert_eq!(keys.as_filter(), vec![vec!["0x1".to_string()], vec!["0x2".to_string()]]);
    }
}
