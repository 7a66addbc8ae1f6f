//! Rate limiting middleware
//!
//! Gates outgoing requests on a token bucket, either one bucket for the whole
//! client or one per endpoint (URL without query string).

use super::pipeline::Middleware;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::rate_limit::{RateLimitConfig, TokenBucket};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Blocks each request until a token is available
#[derive(Debug)]
pub struct RateLimitMiddleware {
    rate: f64,
    capacity: u32,
    timeout: Option<Duration>,
    global: Arc<TokenBucket>,
    per_endpoint: Option<Mutex<HashMap<String, Arc<TokenBucket>>>>,
}

impl RateLimitMiddleware {
    /// One bucket shared by every request
    pub fn new(rate: f64, capacity: u32) -> Result<Self> {
        Ok(Self {
            rate,
            capacity,
            timeout: None,
            global: Arc::new(TokenBucket::new(rate, capacity)?),
            per_endpoint: None,
        })
    }

    /// Build from config
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        let global = Arc::new(config.build()?);
        Ok(Self {
            rate: config.rate,
            capacity: config.capacity,
            timeout: config.timeout(),
            global,
            per_endpoint: config.per_endpoint.then(|| Mutex::new(HashMap::new())),
        })
    }

    /// Keep a separate bucket for each endpoint
    ///
    /// Buckets are created on first use and never removed, so the map grows
    /// by one entry per distinct endpoint for the lifetime of the middleware;
    /// `reset` refills them but keeps them.
    #[must_use]
    pub fn per_endpoint(mut self) -> Self {
        self.per_endpoint = Some(Mutex::new(HashMap::new()));
        self
    }

    /// Fail with `Error::RateLimited` if no token arrives within `timeout`
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether buckets are kept per endpoint
    pub fn is_per_endpoint(&self) -> bool {
        self.per_endpoint.is_some()
    }

    /// Bucket that governs `endpoint`
    pub fn bucket_for(&self, endpoint: &str) -> Result<Arc<TokenBucket>> {
        let Some(buckets) = &self.per_endpoint else {
            return Ok(Arc::clone(&self.global));
        };
        let mut buckets = buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = buckets.get(endpoint) {
            return Ok(Arc::clone(bucket));
        }
        let bucket = Arc::new(TokenBucket::new(self.rate, self.capacity)?);
        buckets.insert(endpoint.to_string(), Arc::clone(&bucket));
        Ok(bucket)
    }

    /// Refill every bucket
    pub fn reset(&self) {
        self.global.reset();
        if let Some(buckets) = &self.per_endpoint {
            let buckets = buckets.lock().unwrap_or_else(PoisonError::into_inner);
            for bucket in buckets.values() {
                bucket.reset();
            }
        }
    }
}

impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &str {
        "rate_limit"
    }

    fn process_request(&self, request: Request) -> Result<Request> {
        let bucket = self.bucket_for(request.endpoint())?;
        if bucket.acquire(1, true, self.timeout) {
            debug!(endpoint = request.endpoint(), "rate limit token acquired");
            return Ok(request);
        }
        let retry_after = bucket.wait_time(1);
        warn!(
            endpoint = request.endpoint(),
            retry_after_ms = retry_after.as_millis() as u64,
            "rate limit wait timed out"
        );
        Err(Error::RateLimited {
            retry_after: Some(retry_after),
        })
    }

    fn process_response(&self, response: Response) -> Result<Response> {
        Ok(response)
    }
}
