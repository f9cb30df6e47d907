//! Starknet event fetcher.
//!
//! Issues `starknet_getEvents` for one block range with the contract address
//! and the two key filters, following continuation tokens until the node
//! reports the range exhausted. Every raw event is decoded in place so the
//! engine sees undecodable events in chain order.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use scoreindex_core::address::normalize_address;
use scoreindex_core::config::SyncConfig;
use scoreindex_core::error::SyncError;
use scoreindex_core::source::EventSource;
use scoreindex_core::types::{BlockRange, EventKeys, FetchedEvent};
use scoreindex_rpc::RpcTransport;

use crate::decode::{decode_game_finished, EventsPage};
use crate::selector::{starknet_keccak, EVENT_EMITTED};

const GET_EVENTS: &str = "starknet_getEvents";

/// [`EventSource`] backed by a Starknet JSON-RPC node.
pub struct StarknetEventSource<T> {
    transport: T,
    contract_address: String,
    keys: EventKeys,
    page_size: u64,
    next_id: AtomicU64,
}

impl<T: RpcTransport> StarknetEventSource<T> {
    /// `contract_address` is normalized; `page_size` is the per-call event cap.
    pub fn new(
        transport: T,
        contract_address: &str,
        keys: EventKeys,
        page_size: u64,
    ) -> Result<Self, SyncError> {
        let contract_address = normalize_address(contract_address)
            .map_err(|e| SyncError::Config(format!("contract address: {e}")))?;
        if keys.game_finished_key.is_empty() {
            return Err(SyncError::Config("game-finished key is empty".into()));
        }
        if page_size == 0 {
            return Err(SyncError::Config("page size must be > 0".into()));
        }
        Ok(Self {
            transport,
            contract_address,
            keys,
            page_size,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build from a [`SyncConfig`]; an unset event key defaults to the
    /// `EventEmitted` selector.
    pub fn from_config(transport: T, config: &SyncConfig) -> Result<Self, SyncError> {
        let keys = EventKeys {
            event_key: config
                .event_key
                .clone()
                .unwrap_or_else(|| starknet_keccak(EVENT_EMITTED)),
            game_finished_key: config.game_finished_key.clone(),
        };
        Self::new(
            transport,
            &config.contract_address,
            keys,
            config.max_events_per_call,
        )
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn keys(&self) -> &EventKeys {
        &self.keys
    }

    fn filter(&self, range: BlockRange, continuation_token: Option<&str>) -> Value {
        let mut filter = json!({
            "from_block": { "block_number": range.from },
            "to_block": { "block_number": range.to },
            "address": self.contract_address,
            "keys": self.keys.as_filter(),
            "chunk_size": self.page_size,
        });
        if let Some(token) = continuation_token {
            filter["continuation_token"] = Value::from(token);
        }
        json!({ "filter": filter })
    }

    async fn fetch_page(
        &self,
        range: BlockRange,
        continuation_token: Option<&str>,
    ) -> Result<EventsPage, SyncError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let result = self
            .transport
            .call(id, GET_EVENTS, self.filter(range, continuation_token))
            .await
            .map_err(|e| {
                SyncError::SourceUnavailable(format!("{GET_EVENTS} {range} via {}: {e}", self.transport.url()))
            })?;
        serde_json::from_value(result).map_err(|e| {
            SyncError::SourceUnavailable(format!("{GET_EVENTS} {range}: malformed result: {e}"))
        })
    }
}

#[async_trait]
impl<T: RpcTransport> EventSource for StarknetEventSource<T> {
    async fn fetch_events(&self, range: BlockRange) -> Result<Vec<FetchedEvent>, SyncError> {
        let mut events = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(range, token.as_deref()).await?;
            pages += 1;
            events.extend(page.events.iter().map(decode_game_finished));

            match page.continuation_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(SyncError::SourceUnavailable(format!(
                        "{GET_EVENTS} {range}: node repeated continuation token {next:?}"
                    )));
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::debug!(
            from = range.from,
            to = range.to,
            pages,
            events = events.len(),
            "fetched game-finished events"
        );
        Ok(events)
    }
}
