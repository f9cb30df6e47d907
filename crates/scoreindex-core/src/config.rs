//! Sync configuration, loaded from the environment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::SyncError;

pub const ENV_RPC_URL: &str = "RPC_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
pub const ENV_START_BLOCK: &str = "START_BLOCK";
pub const ENV_CHUNK_SIZE: &str = "CHUNK_SIZE";
pub const ENV_POLL_INTERVAL_SECONDS: &str = "POLL_INTERVAL_SECONDS";
pub const ENV_MAX_EVENTS_PER_CALL: &str = "MAX_EVENTS_PER_CALL";
pub const ENV_EVENT_KEY: &str = "EVENT_KEY";
pub const ENV_GAME_FINISHED_KEY: &str = "GAME_FINISHED_KEY";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DECODE_POLICY: &str = "DECODE_POLICY";
pub const ENV_RPC_TIMEOUT_SECONDS: &str = "RPC_TIMEOUT_SECONDS";

/// What the engine does with an event it cannot decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Log it at `warn`, count it, and keep going.
    #[default]
    Skip,
    /// Fail the cycle before any ledger write; the cursor stays put.
    Abort,
}

impl FromStr for DecodePolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(SyncError::Config(format!(
                "{ENV_DECODE_POLICY} must be 'skip' or 'abort', got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Configuration for one sync engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Starknet JSON-RPC endpoint.
    pub rpc_url: String,
    /// Contract whose events are indexed.
    pub contract_address: String,
    /// Cursor value used when no cursor record exists yet.
    pub start_block: u64,
    /// Blocks past the cursor covered by one cycle (`[C, C + chunk_size]`).
    pub chunk_size: u64,
    /// Scheduler period in seconds.
    pub poll_interval_secs: u64,
    /// Page size (`chunk_size` in RPC terms) for each `starknet_getEvents` call.
    pub max_events_per_call: u64,
    /// First key filter. `None` = selector of `EventEmitted`.
    pub event_key: Option<String>,
    /// Second key filter: the game-finished type hash.
    pub game_finished_key: String,
    /// SQLite database path or URL.
    pub database_url: String,
    /// Handling of undecodable events.
    pub decode_policy: DecodePolicy,
    /// HTTP request timeout for RPC calls, in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            contract_address: String::new(),
            start_block: 0,
            chunk_size: 10,
            poll_interval_secs: 10,
            max_events_per_call: 1000,
            event_key: None,
            game_finished_key: String::new(),
            database_url: "./scoreindex.db".into(),
            decode_policy: DecodePolicy::Skip,
            rpc_timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_RPC_URL) {
            cfg.rpc_url = v.trim().to_string();
        }
        if let Some(v) = get(ENV_CONTRACT_ADDRESS) {
            cfg.contract_address = v.trim().to_string();
        }
        if let Some(v) = get(ENV_START_BLOCK) {
            cfg.start_block = parse_u64(ENV_START_BLOCK, &v)?;
        }
        if let Some(v) = get(ENV_CHUNK_SIZE) {
            cfg.chunk_size = parse_u64(ENV_CHUNK_SIZE, &v)?;
        }
        if let Some(v) = get(ENV_POLL_INTERVAL_SECONDS) {
            cfg.poll_interval_secs = parse_u64(ENV_POLL_INTERVAL_SECONDS, &v)?;
        }
        if let Some(v) = get(ENV_MAX_EVENTS_PER_CALL) {
            cfg.max_events_per_call = parse_u64(ENV_MAX_EVENTS_PER_CALL, &v)?;
        }
        if let Some(v) = get(ENV_EVENT_KEY) {
            cfg.event_key = Some(v.trim().to_string());
        }
        if let Some(v) = get(ENV_GAME_FINISHED_KEY) {
            cfg.game_finished_key = v.trim().to_string();
        }
        if let Some(v) = get(ENV_DATABASE_URL) {
            cfg.database_url = v.trim().to_string();
        }
        if let Some(v) = get(ENV_DECODE_POLICY) {
            cfg.decode_policy = v.parse()?;
        }
        if let Some(v) = get(ENV_RPC_TIMEOUT_SECONDS) {
            cfg.rpc_timeout_secs = parse_u64(ENV_RPC_TIMEOUT_SECONDS, &v)?;
        }

        if cfg.chunk_size == 0 {
            return Err(SyncError::Config(format!("{ENV_CHUNK_SIZE} must be > 0")));
        }
        if cfg.poll_interval_secs == 0 {
            return Err(SyncError::Config(format!(
                "{ENV_POLL_INTERVAL_SECONDS} must be > 0"
            )));
        }
        if cfg.max_events_per_call == 0 {
            return Err(SyncError::Config(format!(
                "{ENV_MAX_EVENTS_PER_CALL} must be > 0"
            )));
        }
        Ok(cfg)
    }

    /// Check the settings a live sync cannot run without.
    pub fn validate_for_sync(&self) -> Result<(), SyncError> {
        let missing: Vec<&str> = [
            (ENV_RPC_URL, self.rpc_url.is_empty()),
            (ENV_CONTRACT_ADDRESS, self.contract_address.is_empty()),
            (ENV_GAME_FINISHED_KEY, self.game_finished_key.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Config(format!("missing {}", missing.join(", "))))
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, SyncError> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncError::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = SyncConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.start_block, 0);
        assert_eq!(cfg.chunk_size, 10);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.max_events_per_call, 1000);
        assert_eq!(cfg.decode_policy, DecodePolicy::Skip);
        assert!(cfg.event_key.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let cfg = SyncConfig::from_lookup(lookup(&[
            (ENV_RPC_URL, "http://localhost:5050"),
            (ENV_CONTRACT_ADDRESS, "0x123"),
            (ENV_START_BLOCK, "100"),
            (ENV_CHUNK_SIZE, " 20 "),
            (ENV_POLL_INTERVAL_SECONDS, "3"),
            (ENV_EVENT_KEY, "0xe1"),
            (ENV_GAME_FINISHED_KEY, "0xf1"),
            (ENV_DECODE_POLICY, "ABORT"),
        ]))
        .unwrap();
        assert_eq!(cfg.rpc_url, "http://localhost:5050");
        assert_eq!(cfg.start_block, 100);
        assert_eq!(cfg.chunk_size, 20);
        assert_eq!(cfg.poll_interval_secs, 3);
        assert_eq!(cfg.event_key.as_deref(), Some("0xe1"));
        assert_eq!(cfg.decode_policy, DecodePolicy::Abort);
        cfg.validate_for_sync().unwrap();
    }

    #[test]
    fn rejects_bad_integers_and_zero_chunk() {
        let err = SyncConfig::from_lookup(lookup(&[(ENV_START_BLOCK, "-1")])).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));

        let err = SyncConfig::from_lookup(lookup(&[(ENV_CHUNK_SIZE, "0")])).unwrap_err();
        assert!(err.to_string().contains(ENV_CHUNK_SIZE));
    }

    #[test]
    fn rejects_unknown_decode_policy() {
        assert!(SyncConfig::from_lookup(lookup(&[(ENV_DECODE_POLICY, "retry")])).is_err());
    }

    #[test]
    fn validate_lists_missing_settings() {
        let cfg = SyncConfig::from_lookup(lookup(&[(ENV_RPC_URL, "http://x")])).unwrap();
        let msg = cfg.validate_for_sync().unwrap_err().to_string();
        assert!(msg.contains(ENV_CONTRACT_ADDRESS));
        assert!(msg.contains(ENV_GAME_FINISHED_KEY));
        assert!(!msg.contains(ENV_RPC_URL));
    }
}
