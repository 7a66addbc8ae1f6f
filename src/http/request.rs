//! Outgoing request model
//!
//! A `Request` is plain data: middlewares receive it by value, mutate the
//! parts they own and hand it on.

use crate::cache::generate_cache_key;
use crate::types::{JsonValue, Method, StringMap};
use bytes::Bytes;
use std::time::Duration;

/// An HTTP request flowing through the middleware pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, or a path relative to the client's base URL
    pub url: String,
    /// Request headers
    pub headers: StringMap,
    /// Query parameters
    pub params: StringMap,
    /// Raw request body
    pub body: Option<Bytes>,
    /// JSON body (takes precedence over `body`)
    pub json: Option<JsonValue>,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.json = Some(body);
        self
    }

    /// Set raw body
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing any existing one whose name differs only in case
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value.into());
    }

    /// Cache key for this request
    pub fn cache_key(&self) -> String {
        generate_cache_key(self.method, &self.url, &self.params)
    }

    /// Endpoint of this request (URL without query string)
    pub fn endpoint(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}
