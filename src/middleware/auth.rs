//! Authentication middleware
//!
//! Delegates to an injected `AuthStrategy`; it has no idea how any particular
//! scheme works.

use super::pipeline::Middleware;
use crate::auth::AuthStrategy;
use crate::error::Result;
use crate::http::{Request, Response};
use std::sync::Arc;

/// Applies an auth strategy to every outgoing request
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    strategy: Arc<dyn AuthStrategy>,
}

impl AuthMiddleware {
    /// Wrap a strategy
    pub fn new<S: AuthStrategy + 'static>(strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    /// Wrap a shared strategy
    pub fn from_shared(strategy: Arc<dyn AuthStrategy>) -> Self {
        Self { strategy }
    }

    /// The wrapped strategy
    pub fn strategy(&self) -> &Arc<dyn AuthStrategy> {
        &self.strategy
    }
}

impl Middleware for AuthMiddleware {
    fn name(&self) -> &str {
        "auth"
    }

    fn process_request(&self, request: Request) -> Result<Request> {
        self.strategy.apply(request)
    }

    fn process_response(&self, response: Response) -> Result<Response> {
        Ok(response)
    }
}
