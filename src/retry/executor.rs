//! Blocking retry loop

use super::RetryStrategy;
use crate::error::{Error, Result};
use std::thread;
use tracing::{debug, warn};

/// Run `operation` until it succeeds or `strategy` gives up
///
/// `operation` receives the 0-indexed attempt number. A non-retryable error
/// is returned as is; once retries run out the last error is wrapped in
/// [`Error::RetriesExhausted`]. Between attempts the calling thread sleeps
/// for the strategy's delay, raised to the error's `Retry-After` hint when
/// there is one (the hint itself is capped at the strategy's `max_delay`).
pub fn execute_with_retry<T, F>(strategy: &dyn RetryStrategy, mut operation: F) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let mut attempt: u32 = 0;
    loop {
        let error = match operation(attempt) {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !strategy.is_retryable_error(&error) {
            return Err(error);
        }
        if !strategy.should_retry(attempt, &error) {
            warn!(
                attempts = attempt + 1,
                error = %error,
                "giving up after exhausting retries"
            );
            return Err(Error::RetriesExhausted {
                attempts: attempt + 1,
                last_error: Box::new(error),
            });
        }

        let mut delay = strategy.calculate_delay(attempt);
        if let Some(hint) = error.retry_after() {
            delay = delay.max(hint.min(strategy.max_delay()));
        }
        warn!(
            attempt = attempt + 1,
            max_retries = strategy.max_retries(),
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying after error"
        );
        thread::sleep(delay);
        attempt = attempt.saturating_add(1);
    }
}
