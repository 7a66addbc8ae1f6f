//! Retry strategies
//!
//! A [`RetryStrategy`] decides how many times a failed call is retried and
//! how long to wait in between; [`execute_with_retry`] drives the loop.
//!
//! | Strategy | Delay before retry `n` |
//! |---|---|
//! | [`ExponentialBackoff`] | `min(base * 2^n, max)` |
//! | [`JitteredBackoff`] | `min(base * 2^n * (1 + U(0, jitter)), max)` |
//! | [`FullJitterBackoff`] | `U(0, min(base * 2^n, max))` |

mod executor;
mod strategies;

pub use executor::execute_with_retry;
pub use strategies::{
    ExponentialBackoff, FullJitterBackoff, JitteredBackoff, RetryStrategy, DEFAULT_BASE_DELAY,
    DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Backoff flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    #[default]
    Exponential,
    Jittered,
    FullJitter,
}

/// Serializable description of a retry strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Backoff flavour
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter factor (jittered backoff only)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::default(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY.as_millis() as u64
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY.as_millis() as u64
}

fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl RetryConfig {
    /// Config for the given backoff flavour with default parameters
    pub fn new(backoff_type: BackoffType) -> Self {
        Self {
            backoff_type,
            ..Self::default()
        }
    }

    /// Build the described strategy, validating its parameters
    pub fn build(&self) -> Result<Arc<dyn RetryStrategy>> {
        let base = Duration::from_millis(self.base_delay_ms);
        let max = Duration::from_millis(self.max_delay_ms);
        Ok(match self.backoff_type {
            BackoffType::Exponential => {
                Arc::new(ExponentialBackoff::new(self.max_retries, base, max)?)
            }
            BackoffType::Jittered => Arc::new(JitteredBackoff::new(
                self.max_retries,
                base,
                max,
                self.jitter_factor,
            )?),
            BackoffType::FullJitter => {
                Arc::new(FullJitterBackoff::new(self.max_retries, base, max)?)
            }
        })
    }
}
