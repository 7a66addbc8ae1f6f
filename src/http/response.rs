//! Response snapshot
//!
//! Built once from the raw transport result and read through accessors only.

use crate::error::{Error, Result};
use crate::types::StringMap;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// An HTTP response flowing back through the middleware pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: StringMap,
    body: Bytes,
    url: String,
    elapsed: Duration,
}

impl Response {
    /// Create a response with an empty body
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self {
            status,
            headers: StringMap::new(),
            body: Bytes::new(),
            url: url.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Set a header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Replace all headers
    #[must_use]
    pub fn with_headers(mut self, headers: StringMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the elapsed time
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Raw body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8 (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Final URL of the request
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time spent in the transport
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 4xx or 5xx status
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.status)
    }

    /// Turn 4xx/5xx responses into `Error::HttpStatus`
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_error() {
            return Err(Error::http_status(self.status, self.text()));
        }
        Ok(self)
    }

    /// Parsed `Retry-After` header (delta-seconds form)
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}
