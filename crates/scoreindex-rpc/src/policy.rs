//! Reliability policies applied by the HTTP transport.
//!
//! ```text
//! Request → [RateLimiter] → [RetryPolicy] → HTTP
//! ```

use std::sync::Mutex;
use std::time::{Duration, Instant};

// ─── Retry ────────────────────────────────────────────────────────────────────

/// Exponential backoff settings.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Stateless backoff calculator.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `attempt` (1-based), or `None` once exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let base_ms = self.config.initial_backoff.as_millis() as f64
            * self.config.multiplier.powi(attempt as i32 - 1);
        let capped_ms = base_ms.min(self.config.max_backoff.as_millis() as f64);
        Some(Duration::from_millis(capped_ms as u64))
    }
}

// ─── Rate limiting ────────────────────────────────────────────────────────────

/// Token bucket settings.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Burst size.
    pub capacity: f64,
    /// Tokens added per second.
    pub refill_rate: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            capacity: 20.0,
            refill_rate: 10.0,
        }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Thread-safe token bucket; one token per request.
pub struct RateLimiter {
    config: RateLimiterConfig,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: config.capacity,
                last_refill: Instant::now(),
            }),
            config,
        }
    }

    /// Take a token if one is available.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until the next token is available.
    pub fn wait_time(&self) -> Duration {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        let deficit = 1.0 - bucket.tokens;
        if deficit <= 0.0 || self.config.refill_rate <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(deficit / self.config.refill_rate)
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        while !self.try_acquire() {
            let wait = self.wait_time().max(Duration::from_millis(1));
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limited, backing off");
            tokio::time::sleep(wait).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Bucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.refill_rate).min(self.config.capacity);
        bucket.last_refill = now;
    }
}
