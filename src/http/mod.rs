//! HTTP module
//!
//! Request/response models, the transport seam and the client that ties the
//! middleware pipeline, retry, rate limiting and caching together.
//!
//! # Features
//!
//! - **Middleware**: FIFO request hooks, LIFO response hooks
//! - **Automatic Retries**: pluggable backoff strategies honouring `Retry-After`
//! - **Rate Limiting**: token bucket gate before every attempt
//! - **Caching**: successful GET responses with TTL
//! - **Transport**: blocking reqwest by default, replaceable for tests

mod client;
mod request;
mod response;
mod transport;

pub use client::{HttpClient, HttpClientBuilder, DEFAULT_TIMEOUT};
pub use request::Request;
pub use response::Response;
pub use transport::{ReqwestTransport, Transport};
