//! Transport abstraction
//!
//! The transport performs the actual network call. The client only depends on
//! the `Transport` trait; `ReqwestTransport` is the default implementation.

use super::request::Request;
use super::response::Response;
use crate::error::{Error, Result};
use crate::types::StringMap;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Executes a request and produces a response
pub trait Transport: Send + Sync {
    /// Perform the request
    fn execute(&self, request: &Request) -> Result<Response>;
}

impl<F> Transport for F
where
    F: Fn(&Request) -> Result<Response> + Send + Sync,
{
    fn execute(&self, request: &Request) -> Result<Response> {
        self(request)
    }
}

/// Blocking transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the given default timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    fn build_url(request: &Request) -> Result<Url> {
        if request.params.is_empty() {
            return Ok(Url::parse(&request.url)?);
        }
        // Sorted so the wire order is stable across runs
        let mut params: Vec<(&String, &String)> = request.params.iter().collect();
        params.sort();
        Ok(Url::parse_with_params(&request.url, params)?)
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &Request) -> Result<Response> {
        let url = Self::build_url(request)?;
        let timeout = request.timeout.unwrap_or(self.timeout);

        let mut req = self.client.request(request.method.into(), url);
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if let Some(ref json) = request.json {
            req = req.json(json);
        } else if let Some(ref body) = request.body {
            req = req.body(body.clone());
        }
        req = req.timeout(timeout);

        let started = Instant::now();
        let raw = req.send().map_err(|e| classify(e, timeout))?;

        let status = raw.status().as_u16();
        let final_url = raw.url().to_string();
        let headers: StringMap = raw
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = raw.bytes().map_err(|e| classify(e, timeout))?;
        let elapsed = started.elapsed();

        debug!(
            "{} {} -> {} in {:?}",
            request.method, final_url, status, elapsed
        );

        Ok(Response::new(status, final_url)
            .with_headers(headers)
            .with_body(body)
            .with_elapsed(elapsed))
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Map reqwest failures onto the crate's retry classification
fn classify(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        return Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };
    }
    if err.is_connect() {
        return Error::connection(err.to_string());
    }
    Error::Http(err)
}
