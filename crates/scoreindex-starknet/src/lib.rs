//! scoreindex-starknet: Starknet event source for the leaderboard sync.

pub mod builder;
pub mod decode;
pub mod fetcher;
pub mod selector;

pub use builder::SyncConfigBuilder;
pub use decode::{decode_game_finished, EmittedEvent, EventsPage};
pub use fetcher::StarknetEventSource;
pub use selector::{starknet_keccak, EVENT_EMITTED};
