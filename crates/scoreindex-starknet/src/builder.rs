//! Fluent builder for [`SyncConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use scoreindex_starknet::SyncConfigBuilder;
//!
//! let config = SyncConfigBuilder::new()
//!     .rpc_url("https://starknet-sepolia.public.blastapi.io/rpc/v0_7")
//!     .contract("0x0123")
//!     .game_finished_key("0x02c4")
//!     .start_block(120_000)
//!     .chunk_size(10)
//!     .build()
//!     .unwrap();
//! ```

use scoreindex_core::config::{DecodePolicy, SyncConfig};
use scoreindex_core::error::SyncError;

/// Fluent builder for `SyncConfig`.
#[derive(Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = url.into();
        self
    }

    /// Contract whose game-finished events are indexed.
    pub fn contract(mut self, address: impl Into<String>) -> Self {
        self.config.contract_address = address.into();
        self
    }

    /// Cursor used when none has been persisted yet.
    pub fn start_block(mut self, block: u64) -> Self {
        self.config.start_block = block;
        self
    }

    /// Blocks past the cursor covered by one cycle.
    pub fn chunk_size(mut self, size: u64) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    /// Per-call event cap for `starknet_getEvents`.
    pub fn max_events_per_call(mut self, n: u64) -> Self {
        self.config.max_events_per_call = n;
        self
    }

    /// Override the first key filter (defaults to the `EventEmitted` selector).
    pub fn event_key(mut self, key: impl Into<String>) -> Self {
        self.config.event_key = Some(key.into());
        self
    }

    pub fn game_finished_key(mut self, key: impl Into<String>) -> Self {
        self.config.game_finished_key = key.into();
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.config.decode_policy = policy;
        self
    }

    pub fn rpc_timeout_secs(mut self, secs: u64) -> Self {
        self.config.rpc_timeout_secs = secs;
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        if self.config.chunk_size == 0 {
            return Err(SyncError::Config("chunk size must be > 0".into()));
        }
        if self.config.poll_interval_secs == 0 {
            return Err(SyncError::Config("poll interval must be > 0".into()));
        }
        if self.config.max_events_per_call == 0 {
            return Err(SyncError::Config("max events per call must be > 0".into()));
        }
        self.config.validate_for_sync()?;
        Ok(self.config)
    }
}
