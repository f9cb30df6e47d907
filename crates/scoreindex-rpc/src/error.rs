//! Transport-level error types.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur while talking to an RPC node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure or non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// No response within the configured request timeout.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The response body did not match the expected shape.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Returns `true` for transient failures worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_retry() {
        assert!(TransportError::Http("connection refused".into()).is_retryable());
        assert!(TransportError::Timeout { ms: 30_000 }.is_retryable());
        assert!(!TransportError::Rpc(JsonRpcError {
            code: 24,
            message: "Block not found".into(),
            data: None,
        })
        .is_retryable());
    }

    #[test]
    fn rpc_error_display() {
        let err = TransportError::Rpc(JsonRpcError {
            code: 33,
            message: "The supplied continuation token is invalid or unknown".into(),
            data: None,
        });
        assert_eq!(
            err.to_string(),
            "RPC error 33: The supplied continuation token is invalid or unknown"
        );
    }
}
