//! The event-source seam between the sync engine and the chain.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::types::{BlockRange, FetchedEvent};

/// Source of game-finished events for a bounded block range.
///
/// The returned sequence is finite and in chain order. Undecodable events are
/// returned in place as `Err(DecodeFailure)` so the engine can apply its
/// decode policy; an unreachable source fails the whole call with
/// [`SyncError::SourceUnavailable`]. Calls are not resumable: a retry re-issues
/// the full range.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, range: BlockRange) -> Result<Vec<FetchedEvent>, SyncError>;
}

#[async_trait]
impl<T: EventSource + ?Sized> EventSource for std::sync::Arc<T> {
    async fn fetch_events(&self, range: BlockRange) -> Result<Vec<FetchedEvent>, SyncError> {
        (**self).fetch_events(range).await
    }
}
