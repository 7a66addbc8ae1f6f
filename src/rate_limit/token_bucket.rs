//! Token bucket rate limiter
//!
//! Tokens accrue continuously at `rate` per second up to `capacity`. Refill is
//! lazy: every call reconciles the elapsed time under the lock before looking
//! at the level, so there is no background timer. Blocked callers sleep on a
//! condvar (the lock is released while they wait) for exactly as long as the
//! current deficit needs at the configured rate, then re-check.

use crate::error::{Error, Result};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, rate: f64, capacity: f64) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Thread-safe token bucket
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
    refilled: Condvar,
}

impl TokenBucket {
    /// Create a bucket that starts full
    ///
    /// `rate` is tokens per second and must be positive and finite;
    /// `capacity` must be at least one token.
    pub fn new(rate: f64, capacity: u32) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::config(format!(
                "rate must be a positive number, got {rate}"
            )));
        }
        if capacity == 0 {
            return Err(Error::config("capacity must be positive"));
        }
        let capacity = f64::from(capacity);
        Ok(Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            refilled: Condvar::new(),
        })
    }

    /// Tokens added per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maximum number of tokens
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    // The state is two plain numbers and is never left half-updated, so a
    // panic in another holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deficit_wait(&self, needed: f64, available: f64) -> Duration {
        if available >= needed {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64((needed - available) / self.rate).unwrap_or(Duration::MAX)
    }

    /// Try to take `tokens` from the bucket
    ///
    /// Non-blocking calls return immediately. Blocking calls wait until the
    /// tokens are available or `timeout` (if any) elapses, and return `false`
    /// on timeout. A request larger than the capacity can never be satisfied
    /// and returns `false` right away.
    pub fn acquire(&self, tokens: u32, blocking: bool, timeout: Option<Duration>) -> bool {
        let needed = f64::from(tokens);
        if needed > self.capacity {
            debug!(
                tokens,
                capacity = self.capacity,
                "requested more tokens than the bucket can hold"
            );
            return false;
        }

        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.lock();
        loop {
            state.refill(self.rate, self.capacity);
            if state.tokens >= needed {
                state.tokens -= needed;
                return true;
            }
            if !blocking {
                return false;
            }

            let mut wait = self.deficit_wait(needed, state.tokens);
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    debug!(tokens, "token acquisition timed out");
                    return false;
                }
                wait = wait.min(deadline - now);
            }

            state = self
                .refilled
                .wait_timeout(state, wait)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Non-blocking acquire
    pub fn try_acquire(&self, tokens: u32) -> bool {
        self.acquire(tokens, false, None)
    }

    /// Time until `tokens` would be available at the current level and rate
    pub fn wait_time(&self, tokens: u32) -> Duration {
        let mut state = self.lock();
        state.refill(self.rate, self.capacity);
        self.deficit_wait(f64::from(tokens), state.tokens)
    }

    /// Current number of tokens
    pub fn available_tokens(&self) -> f64 {
        let mut state = self.lock();
        state.refill(self.rate, self.capacity);
        state.tokens
    }

    /// Refill to full capacity and wake any waiters
    pub fn reset(&self) {
        let mut state = self.lock();
        state.tokens = self.capacity;
        state.last_refill = Instant::now();
        drop(state);
        self.refilled.notify_all();
    }
}
