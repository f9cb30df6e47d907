//! Starknet address normalization.
//!
//! Ledger records are keyed by the fixed-width form: `0x` followed by exactly
//! 64 lower-case hex digits. Chain events and user input may carry the short
//! form (`0x49d3…` without leading zeros), so every address goes through
//! [`normalize_address`] before it touches a store.

use crate::error::SyncError;

/// Number of hex digits in a normalized felt address.
pub const ADDRESS_HEX_LEN: usize = 64;

/// Normalize `raw` into `0x` + 64 lower-case hex digits.
///
/// Rejects input without a `0x` prefix, with non-hex characters, or with more
/// than 64 significant digits.
pub fn normalize_address(raw: &str) -> Result<String, SyncError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| invalid(raw, "missing 0x prefix"))?;

    if digits.is_empty() {
        return Err(invalid(raw, "no hex digits"));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(raw, "non-hex character"));
    }
    if digits.len() > ADDRESS_HEX_LEN {
        return Err(invalid(raw, "longer than 64 hex digits"));
    }

    Ok(format!(
        "0x{:0>width$}",
        digits.to_ascii_lowercase(),
        width = ADDRESS_HEX_LEN
    ))
}

fn invalid(raw: &str, reason: &str) -> SyncError {
    SyncError::Decode {
        block_number: 0,
        reason: format!("invalid address {raw:?}: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_address() {
        let addr = normalize_address("0xABC").unwrap();
        assert_eq!(addr.len(), 66);
        assert!(addr.starts_with("0x0000"));
        assert!(addr.ends_with("abc"));
    }

    #[test]
    fn full_width_address_is_lowercased() {
        let raw = format!("0x{}", "F".repeat(64));
        assert_eq!(normalize_address(&raw).unwrap(), format!("0x{}", "f".repeat(64)));
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_address(" 0x49D36570D4e46f48e99674bd3fcc84644DdD6b96F7C741B1562B82f9e004dC7 ").unwrap();
        let twice = normalize_address(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(matches!(
            normalize_address("abc"),
            Err(SyncError::Decode { .. })
        ));
    }

    #[test]
    fn rejects_non_hex_and_overlong() {
        assert!(normalize_address("0xzz").is_err());
        assert!(normalize_address("0x").is_err());
        assert!(normalize_address(&format!("0x1{}", "0".repeat(64))).is_err());
    }
}
