//! HTTP client with middleware, retry, rate limiting and caching
//!
//! Every request goes through the same steps:
//!
//! 1. default headers and timeout are filled in and the URL is resolved
//!    against the base URL
//! 2. the middleware pipeline processes the request
//! 3. GET requests are looked up in the cache; a hit skips the network
//! 4. each transport attempt first takes a token from the rate limiter
//! 5. failures are retried according to the retry strategy
//! 6. successful GET responses are cached
//! 7. the middleware pipeline processes the response in reverse order

use super::transport::{ReqwestTransport, Transport};
use super::{Request, Response};
use crate::auth::AuthStrategy;
use crate::cache::Cache;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::middleware::{
    AuthMiddleware, LoggingMiddleware, Middleware, MiddlewarePipeline, RateLimitMiddleware,
};
use crate::rate_limit::TokenBucket;
use crate::retry::{execute_with_retry, RetryStrategy};
use crate::types::{JsonValue, Method, StringMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn default_user_agent() -> String {
    format!("solidafy-http/{}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`HttpClient`]
#[derive(Default)]
pub struct HttpClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    headers: StringMap,
    user_agent: Option<String>,
    pipeline: MiddlewarePipeline,
    retry: Option<Arc<dyn RetryStrategy>>,
    rate_limiter: Option<Arc<TokenBucket>>,
    rate_limit_timeout: Option<Duration>,
    cache: Option<Arc<dyn Cache>>,
    cache_ttl: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl HttpClientBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a builder from a [`ClientConfig`]
    ///
    /// Auth, per-endpoint rate limiting and logging become middlewares, in
    /// that order.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new().timeout(config.timeout());
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        for (key, value) in &config.headers {
            builder = builder.header(key, value);
        }
        if let Some(strategy) = config.auth.build_strategy()? {
            builder = builder.middleware(AuthMiddleware::from_shared(strategy));
        }
        if let Some(retry) = &config.retry {
            builder = builder.with_retry_shared(retry.build()?);
        }
        if let Some(rate_limit) = &config.rate_limit {
            if rate_limit.per_endpoint {
                builder = builder.middleware(RateLimitMiddleware::from_config(rate_limit)?);
            } else {
                builder = builder.rate_limit(rate_limit.build()?);
                if let Some(timeout) = rate_limit.timeout() {
                    builder = builder.rate_limit_timeout(timeout);
                }
            }
        }
        if let Some(cache) = &config.cache {
            builder = builder.cache(cache.build()?);
        }
        if config.logging.enabled {
            builder = builder.middleware(LoggingMiddleware::with_level(config.logging.level));
        }
        Ok(builder)
    }

    /// Base URL that relative paths are joined onto
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Default timeout for requests that do not set one
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Header sent with every request unless the request sets it
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// User agent for the default transport
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Append a middleware
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.pipeline.add(middleware);
        self
    }

    /// Append an [`AuthMiddleware`] for `strategy`
    pub fn with_auth<S: AuthStrategy + 'static>(self, strategy: S) -> Self {
        self.middleware(AuthMiddleware::new(strategy))
    }

    /// Retry failed requests with `strategy`
    pub fn with_retry<R: RetryStrategy + 'static>(self, strategy: R) -> Self {
        self.with_retry_shared(Arc::new(strategy))
    }

    /// Retry failed requests with a shared strategy
    pub fn with_retry_shared(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry = Some(strategy);
        self
    }

    /// Take one token from `bucket` before every transport attempt
    pub fn rate_limit(self, bucket: TokenBucket) -> Self {
        self.rate_limit_shared(Arc::new(bucket))
    }

    /// Take one token from a shared bucket before every transport attempt
    pub fn rate_limit_shared(mut self, bucket: Arc<TokenBucket>) -> Self {
        self.rate_limiter = Some(bucket);
        self
    }

    /// Give up on a token after `timeout` with `Error::RateLimited`
    pub fn rate_limit_timeout(mut self, timeout: Duration) -> Self {
        self.rate_limit_timeout = Some(timeout);
        self
    }

    /// Cache successful GET responses
    pub fn cache<C: Cache + 'static>(self, cache: C) -> Self {
        self.cache_shared(Arc::new(cache))
    }

    /// Cache successful GET responses in a shared cache
    pub fn cache_shared(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// TTL for cached responses; the cache default applies otherwise
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Replace the default reqwest transport
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<HttpClient> {
        let base_url = match self.base_url {
            Some(base_url) => {
                let parsed = Url::parse(&base_url)?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(Error::config(format!(
                        "Unsupported base URL scheme '{}'",
                        parsed.scheme()
                    )));
                }
                Some(base_url.trim_end_matches('/').to_string())
            }
            None => None,
        };
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let user_agent = self.user_agent.unwrap_or_else(default_user_agent);
                Arc::new(ReqwestTransport::new(timeout, &user_agent)?)
            }
        };

        Ok(HttpClient {
            base_url,
            timeout,
            default_headers: self.headers,
            pipeline: Arc::new(self.pipeline),
            transport,
            retry: self.retry,
            rate_limiter: self.rate_limiter,
            rate_limit_timeout: self.rate_limit_timeout,
            cache: self.cache,
            cache_ttl: self.cache_ttl,
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client
///
/// Cheap to clone; clones share the pipeline, rate limiter and cache.
#[derive(Clone)]
pub struct HttpClient {
    base_url: Option<String>,
    timeout: Duration,
    default_headers: StringMap,
    pipeline: Arc<MiddlewarePipeline>,
    transport: Arc<dyn Transport>,
    retry: Option<Arc<dyn RetryStrategy>>,
    rate_limiter: Option<Arc<TokenBucket>>,
    rate_limit_timeout: Option<Duration>,
    cache: Option<Arc<dyn Cache>>,
    cache_ttl: Option<Duration>,
}

impl HttpClient {
    /// Create a builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Build a client from config
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        HttpClientBuilder::from_config(config)?.build()
    }

    /// Send a request
    pub fn execute(&self, request: Request) -> Result<Response> {
        let request = self.prepare(request);
        let request = self.pipeline.execute_request(request)?;

        let cache_key = match (&self.cache, request.method) {
            (Some(_), Method::GET) => Some(request.cache_key()),
            _ => None,
        };
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(hit) = cache.get(key) {
                debug!(key = %key, "cache hit");
                return self.pipeline.execute_response(hit);
            }
            debug!(key = %key, "cache miss");
        }

        let response = match &self.retry {
            Some(strategy) => execute_with_retry(strategy.as_ref(), |attempt| {
                if attempt > 0 {
                    debug!(attempt, url = %request.url, "retrying request");
                }
                self.send_checked(&request)
            })?,
            None => self.send(&request)?,
        };

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if response.is_success() {
                cache.set(key, response.clone(), self.cache_ttl);
            }
        }

        self.pipeline.execute_response(response)
    }

    /// GET `path`
    pub fn get(&self, path: &str) -> Result<Response> {
        self.execute(Request::get(path))
    }

    /// GET `path` with query parameters
    pub fn get_with_params<K, V>(
        &self,
        path: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Response>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.execute(Request::get(path).params(params))
    }

    /// POST a JSON body to `path`
    pub fn post(&self, path: &str, body: JsonValue) -> Result<Response> {
        self.execute(Request::post(path).json(body))
    }

    /// PUT a JSON body to `path`
    pub fn put(&self, path: &str, body: JsonValue) -> Result<Response> {
        self.execute(Request::new(Method::PUT, path).json(body))
    }

    /// PATCH a JSON body to `path`
    pub fn patch(&self, path: &str, body: JsonValue) -> Result<Response> {
        self.execute(Request::new(Method::PATCH, path).json(body))
    }

    /// DELETE `path`
    pub fn delete(&self, path: &str) -> Result<Response> {
        self.execute(Request::new(Method::DELETE, path))
    }

    /// The middleware pipeline
    pub fn pipeline(&self) -> &MiddlewarePipeline {
        &self.pipeline
    }

    /// Base URL, without trailing slash
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Default request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    pub fn has_retry(&self) -> bool {
        self.retry.is_some()
    }

    /// Fill in defaults and resolve the URL
    fn prepare(&self, mut request: Request) -> Request {
        request.url = self.build_url(&request.url);
        for (key, value) in &self.default_headers {
            if request.header_value(key).is_none() {
                request.headers.insert(key.clone(), value.clone());
            }
        }
        if request.timeout.is_none() {
            request.timeout = Some(self.timeout);
        }
        request
    }

    /// Join a path onto the base URL; absolute URLs pass through
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.base_url {
            Some(base) => {
                let path = path.trim_start_matches('/');
                if path.is_empty() {
                    base.clone()
                } else {
                    format!("{base}/{path}")
                }
            }
            None => path.to_string(),
        }
    }

    /// One transport attempt, gated by the rate limiter
    fn send(&self, request: &Request) -> Result<Response> {
        if let Some(bucket) = &self.rate_limiter {
            if !bucket.acquire(1, true, self.rate_limit_timeout) {
                let retry_after = bucket.wait_time(1);
                warn!(
                    url = %request.url,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "rate limiter denied request"
                );
                return Err(Error::RateLimited {
                    retry_after: Some(retry_after),
                });
            }
        }
        self.transport.execute(request)
    }

    /// Like [`send`](Self::send), but 429 and 5xx become errors so the retry
    /// strategy can classify them
    fn send_checked(&self, request: &Request) -> Result<Response> {
        let response = self.send(request)?;
        match response.status() {
            429 => Err(Error::RateLimited {
                retry_after: response.retry_after(),
            }),
            status @ 500..=599 => Err(Error::http_status(status, response.text())),
            _ => Ok(response),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("pipeline", &self.pipeline)
            .field("retry", &self.retry)
            .field("rate_limiter", &self.rate_limiter)
            .field("has_cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
