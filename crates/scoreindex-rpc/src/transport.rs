//! The `RpcTransport` trait: what the event source needs from a node connection.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Async JSON-RPC transport.
///
/// Object-safe, so it can be stored as `Arc<dyn RpcTransport>`. Implementations
/// are expected to enforce their own request timeout; callers never cancel an
/// in-flight request.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send a single request and return the raw response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Endpoint identifier for logs.
    fn url(&self) -> &str;

    /// Call `method` and return its `result`, mapping an RPC error object to
    /// [`TransportError::Rpc`].
    async fn call(&self, id: u64, method: &str, params: Value) -> Result<Value, TransportError> {
        let resp = self.send(JsonRpcRequest::new(id, method, params)).await?;
        resp.into_result().map_err(TransportError::Rpc)
    }
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        (**self).send(req).await
    }

    fn url(&self) -> &str {
        (**self).url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::JsonRpcError;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl RpcTransport for Echo {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            if req.method == "fail" {
                return Ok(JsonRpcResponse {
                    jsonrpc: "2.0".into(),
                    id: Value::from(req.id),
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32601,
                        message: "Method not found".into(),
                        data: None,
                    }),
                });
            }
            Ok(JsonRpcResponse::ok(req.id, req.params))
        }

        fn url(&self) -> &str {
            "mock://echo"
        }
    }

    #[tokio::test]
    async fn call_returns_result() {
        let transport: Arc<dyn RpcTransport> = Arc::new(Echo);
        let v = transport.call(1, "echo", json!({ "a": 1 })).await.unwrap();
        assert_eq!(v, json!({ "a": 1 }));
        assert_eq!(transport.url(), "mock://echo");
    }

    #[tokio::test]
    async fn call_maps_rpc_error() {
        let err = Echo.call(1, "fail", Value::Null).await.unwrap_err();
        assert!(matches!(err, TransportError::Rpc(ref e) if e.code == -32601));
    }
}
