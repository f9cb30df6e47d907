//! Error types for the sync pipeline.

use thiserror::Error;

/// Errors that can abort a sync cycle (or startup, for `Config`).
///
/// None of these are fatal to the process: the scheduler logs them and
/// retries the same block range on the next tick.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The chain RPC could not be reached or returned an error.
    #[error("event source unavailable: {0}")]
    SourceUnavailable(String),

    /// A cursor or player record could not be read or written.
    #[error("store error: {0}")]
    Store(String),

    /// A raw event (or an address inside it) could not be decoded.
    #[error("decode error at block {block_number}: {reason}")]
    Decode { block_number: u64, reason: String },

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SyncError {
    /// Returns `true` if re-running the cycle may succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_variants() {
        assert!(SyncError::SourceUnavailable("timeout".into()).is_retryable());
        assert!(SyncError::Store("disk full".into()).is_retryable());
        assert!(!SyncError::Config("CHUNK_SIZE".into()).is_retryable());
        assert!(!SyncError::Decode {
            block_number: 7,
            reason: "short data".into()
        }
        .is_retryable());
    }

    #[test]
    fn decode_error_message_names_block() {
        let err = SyncError::Decode {
            block_number: 42,
            reason: "missing loser".into(),
        };
        assert_eq!(err.to_string(), "decode error at block 42: missing loser");
    }
}
