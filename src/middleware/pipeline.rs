//! Middleware trait and the pipeline that chains middlewares
//!
//! Requests flow head→tail through `process_request`; responses flow
//! tail→head through `process_response`, so the middleware that touched the
//! request last is the first to see the response.

use crate::error::Result;
use crate::http::{Request, Response};
use std::sync::Arc;
use tracing::trace;

/// A request/response processing step
///
/// Middlewares are shared between threads and must be stateless or
/// internally synchronized.
pub trait Middleware: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        "middleware"
    }

    /// Process (and possibly modify) an outgoing request
    fn process_request(&self, request: Request) -> Result<Request>;

    /// Process (and possibly modify) an incoming response
    fn process_response(&self, response: Response) -> Result<Response>;
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn process_request(&self, request: Request) -> Result<Request> {
        (**self).process_request(request)
    }

    fn process_response(&self, response: Response) -> Result<Response> {
        (**self).process_response(response)
    }
}

/// Ordered chain of middlewares
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    chain: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware to the tail of the chain
    pub fn add<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.chain.push(Arc::new(middleware));
        self
    }

    /// Append a shared middleware to the tail of the chain
    pub fn add_shared(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.chain.push(middleware);
        self
    }

    /// Number of middlewares
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Middleware names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.chain.iter().map(|m| m.name()).collect()
    }

    /// Run the request through every middleware, head to tail
    ///
    /// Stops at the first error and returns it unchanged.
    pub fn execute_request(&self, request: Request) -> Result<Request> {
        let mut request = request;
        for middleware in &self.chain {
            trace!(middleware = middleware.name(), "process_request");
            request = middleware.process_request(request)?;
        }
        Ok(request)
    }

    /// Run the response through every middleware, tail to head
    ///
    /// Stops at the first error and returns it unchanged.
    pub fn execute_response(&self, response: Response) -> Result<Response> {
        let mut response = response;
        for middleware in self.chain.iter().rev() {
            trace!(middleware = middleware.name(), "process_response");
            response = middleware.process_response(response)?;
        }
        Ok(response)
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middlewares", &self.names())
            .finish()
    }
}
