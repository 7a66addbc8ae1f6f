//! Backoff strategies
//!
//! All three strategies grow the base delay as `base * 2^attempt` and differ
//! only in how randomness is applied. Arithmetic is done in `f64` seconds so
//! very large attempt numbers saturate at `max_delay` instead of overflowing.

use crate::error::{Error, Result};
use rand::Rng;
use std::fmt::Debug;
use std::time::Duration;

/// Default number of retries
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound for any single delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
/// Default jitter factor for [`JitteredBackoff`]
pub const DEFAULT_JITTER_FACTOR: f64 = 0.3;

/// Decides whether and when a failed call is retried
pub trait RetryStrategy: Send + Sync + Debug {
    /// Maximum number of retries (not counting the first attempt)
    fn max_retries(&self) -> u32;

    /// Upper bound for any single delay
    fn max_delay(&self) -> Duration;

    /// Delay before retry number `attempt` (0-indexed)
    fn calculate_delay(&self, attempt: u32) -> Duration;

    /// Whether the call that failed on `attempt` should be retried
    fn should_retry(&self, attempt: u32, error: &Error) -> bool {
        attempt < self.max_retries() && self.is_retryable_error(error)
    }

    /// Whether `error` is worth retrying at all
    fn is_retryable_error(&self, error: &Error) -> bool {
        error.is_retryable()
    }
}

fn validate_delays(base_delay: Duration, max_delay: Duration) -> Result<()> {
    if base_delay.is_zero() {
        return Err(Error::config("base_delay must be positive"));
    }
    if max_delay < base_delay {
        return Err(Error::config(format!(
            "max_delay ({max_delay:?}) must be >= base_delay ({base_delay:?})"
        )));
    }
    Ok(())
}

/// `base * 2^attempt` in seconds, `None` once it reaches `max`
fn exponential_secs(base: Duration, max: Duration, attempt: u32) -> Option<f64> {
    let exponent = attempt.min(1024) as i32;
    let secs = base.as_secs_f64() * 2f64.powi(exponent);
    (secs.is_finite() && secs < max.as_secs_f64()).then_some(secs)
}

fn uniform(upper: f64) -> f64 {
    if upper <= 0.0 {
        return 0.0;
    }
    rand::rng().random_range(0.0..=upper)
}

fn capped(secs: f64, max: Duration) -> Duration {
    if !secs.is_finite() || secs >= max.as_secs_f64() {
        return max;
    }
    Duration::from_secs_f64(secs.max(0.0))
}

// ============================================================================
// Exponential
// ============================================================================

/// `min(base * 2^attempt, max_delay)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoff {
    /// Create a new strategy; fails if `base_delay` is zero or above `max_delay`
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Result<Self> {
        validate_delays(base_delay, max_delay)?;
        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
        })
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        match exponential_secs(self.base_delay, self.max_delay, attempt) {
            Some(secs) => Duration::from_secs_f64(secs),
            None => self.max_delay,
        }
    }
}

// ============================================================================
// Jittered
// ============================================================================

/// Exponential delay plus up to `jitter_factor` of itself, capped at `max_delay`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitteredBackoff {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl JitteredBackoff {
    /// Create a new strategy; `jitter_factor` must be within `[0, 1]`
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        jitter_factor: f64,
    ) -> Result<Self> {
        validate_delays(base_delay, max_delay)?;
        if !jitter_factor.is_finite() || !(0.0..=1.0).contains(&jitter_factor) {
            return Err(Error::config(format!(
                "jitter_factor must be between 0.0 and 1.0, got {jitter_factor}"
            )));
        }
        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
            jitter_factor,
        })
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }
}

impl Default for JitteredBackoff {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl RetryStrategy for JitteredBackoff {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let Some(base) = exponential_secs(self.base_delay, self.max_delay, attempt) else {
            return self.max_delay;
        };
        capped(base + uniform(base * self.jitter_factor), self.max_delay)
    }
}

// ============================================================================
// Full jitter
// ============================================================================

/// Uniform delay in `[0, min(base * 2^attempt, max_delay)]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullJitterBackoff {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl FullJitterBackoff {
    /// Create a new strategy; fails if `base_delay` is zero or above `max_delay`
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Result<Self> {
        validate_delays(base_delay, max_delay)?;
        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
        })
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }
}

impl Default for FullJitterBackoff {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryStrategy for FullJitterBackoff {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn max_delay(&self) -> Duration {
        self.max_delay
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let cap = exponential_secs(self.base_delay, self.max_delay, attempt)
            .unwrap_or_else(|| self.max_delay.as_secs_f64());
        capped(uniform(cap), self.max_delay)
    }
}
