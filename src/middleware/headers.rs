//! Static header injection

use super::pipeline::Middleware;
use crate::error::Result;
use crate::http::{Request, Response};
use crate::types::StringMap;

/// Adds a fixed set of headers to every request, overwriting same-named ones
#[derive(Debug, Clone, Default)]
pub struct HeaderMiddleware {
    headers: StringMap,
}

impl HeaderMiddleware {
    /// Create from a header map
    pub fn new(headers: StringMap) -> Self {
        Self { headers }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

impl Middleware for HeaderMiddleware {
    fn name(&self) -> &str {
        "headers"
    }

    fn process_request(&self, mut request: Request) -> Result<Request> {
        for (key, value) in &self.headers {
            request.set_header(key.clone(), value.clone());
        }
        Ok(request)
    }

    fn process_response(&self, response: Response) -> Result<Response> {
        Ok(response)
    }
}
