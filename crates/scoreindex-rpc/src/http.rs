//! HTTP JSON-RPC client backed by `reqwest`.
//!
//! - Per-request timeout (the only cancellation an in-flight fetch gets)
//! - Exponential backoff retry for transient failures
//! - Token bucket rate limiting so chunked polling stays under provider limits

use async_trait::async_trait;
use std::time::Duration;

use crate::error::TransportError;
use crate::policy::{RateLimiter, RateLimiterConfig, RetryConfig, RetryPolicy};
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

/// Configuration for [`HttpRpcClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub retry: RetryConfig,
    pub rate_limiter: RateLimiterConfig,
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP JSON-RPC client.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    rate_limiter: RateLimiter,
    request_timeout: Duration,
}

impl HttpRpcClient {
    /// Create a client for the given endpoint.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            retry: RetryPolicy::new(config.retry),
            rate_limiter: RateLimiter::new(config.rate_limiter),
            request_timeout: config.request_timeout,
        })
    }

    async fn send_once(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {}: {body}", status.as_u16())));
        }

        let bytes = resp.bytes().await.map_err(|e| self.map_reqwest(e))?;
        Ok(serde_json::from_slice::<JsonRpcResponse>(&bytes)?)
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let mut attempt = 0u32;
        loop {
            self.rate_limiter.acquire().await;

            match self.send_once(&req).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    match self.retry.next_delay(attempt) {
                        Some(delay) => {
                            tracing::warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                method = %req.method,
                                error = %e,
                                "retrying RPC request"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}
