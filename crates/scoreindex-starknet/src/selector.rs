//! Starknet event selectors.

use tiny_keccak::{Hasher, Keccak};

/// Name of the world contract's generic event; its selector is the default first key.
pub const EVENT_EMITTED: &str = "EventEmitted";

/// Starknet's `sn_keccak`: keccak-256 truncated to the low 250 bits.
///
/// Rendered as `0x`-prefixed hex without leading zeros, the form nodes
/// return in event `keys`.
pub fn starknet_keccak(name: &str) -> String {
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(name.as_bytes());
    hasher.finalize(&mut hash);
    hash[0] &= 0x03;

    let encoded = hex::encode(hash);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}
