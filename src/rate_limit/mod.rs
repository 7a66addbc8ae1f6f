//! Rate limiting
//!
//! A token bucket that bounds call rate to `rate` tokens per second with a
//! burst of `capacity`, safe to share between threads.

mod token_bucket;

pub use token_bucket::TokenBucket;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens (requests) added per second
    pub rate: f64,
    /// Burst size (max tokens in bucket)
    pub capacity: u32,
    /// How long a request may wait for a token; `None` waits indefinitely
    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,
    /// Keep one bucket per endpoint instead of a single global bucket
    #[serde(default)]
    pub per_endpoint: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 10.0,
            capacity: 10,
            acquire_timeout_ms: None,
            per_endpoint: false,
        }
    }
}

impl RateLimitConfig {
    /// Create a new rate limit config
    pub fn new(rate: f64, capacity: u32) -> Self {
        Self {
            rate,
            capacity,
            ..Self::default()
        }
    }

    /// Create config for high throughput (100 rps)
    pub fn high_throughput() -> Self {
        Self::new(100.0, 100)
    }

    /// Create config for low throughput (1 rps)
    pub fn low_throughput() -> Self {
        Self::new(1.0, 1)
    }

    /// Set the acquire timeout
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Acquire timeout as a `Duration`
    pub fn timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    /// Check the values without building a bucket
    pub fn validate(&self) -> Result<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(Error::invalid_value("rate_limit.rate", "must be positive"));
        }
        if self.capacity == 0 {
            return Err(Error::invalid_value(
                "rate_limit.capacity",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Build a bucket from this config
    pub fn build(&self) -> Result<TokenBucket> {
        self.validate()?;
        TokenBucket::new(self.rate, self.capacity)
    }
}
