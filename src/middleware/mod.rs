//! Request/response middleware
//!
//! A [`MiddlewarePipeline`] holds an ordered chain of [`Middleware`]s. Each
//! request passes through them in registration order and each response in
//! reverse order; the first error aborts the pass.
//!
//! Built-in middlewares:
//! - [`AuthMiddleware`] applies an [`AuthStrategy`](crate::auth::AuthStrategy)
//! - [`HeaderMiddleware`] injects fixed headers
//! - [`LoggingMiddleware`] logs traffic through `tracing`
//! - [`RateLimitMiddleware`] gates requests on a token bucket

mod auth;
mod headers;
mod logging;
mod pipeline;
mod rate_limit;

pub use auth::AuthMiddleware;
pub use headers::HeaderMiddleware;
pub use logging::LoggingMiddleware;
pub use pipeline::{Middleware, MiddlewarePipeline};
pub use rate_limit::RateLimitMiddleware;

#[cfg(test)]
mod tests;
