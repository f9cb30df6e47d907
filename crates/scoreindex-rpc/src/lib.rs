//! scoreindex-rpc: JSON-RPC 2.0 transport for the event source.
//!
//! - [`RpcTransport`]: async trait the event source is written against
//! - [`HttpRpcClient`]: `reqwest` transport with request timeout, retry and rate limiting
//! - [`TransportError`]: structured transport failures

pub mod error;
pub mod http;
pub mod policy;
pub mod request;
pub mod transport;

pub use error::TransportError;
pub use http::{HttpClientConfig, HttpRpcClient};
pub use policy::{RateLimiter, RateLimiterConfig, RetryConfig, RetryPolicy};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use transport::RpcTransport;
