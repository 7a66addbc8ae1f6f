// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Solidafy HTTP
//!
//! A resilient, blocking HTTP client built from small composable parts.
//!
//! ## Features
//!
//! - **Middleware Pipeline**: request hooks run in order, response hooks in reverse
//! - **Auth Strategies**: Bearer, Basic, API key (header or query), custom headers
//! - **Retry Strategies**: exponential, jittered and full-jitter backoff
//! - **Rate Limiting**: thread-safe token bucket with blocking acquire
//! - **Caching**: in-memory response cache with TTL and bounded size
//! - **Configuration**: whole clients described in YAML or JSON
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_http::auth::BearerTokenAuth;
//! use solidafy_http::cache::MemoryCache;
//! use solidafy_http::rate_limit::TokenBucket;
//! use solidafy_http::retry::JitteredBackoff;
//! use solidafy_http::{HttpClient, Result};
//!
//! fn main() -> Result<()> {
//!     let client = HttpClient::builder()
//!         .base_url("https://api.example.com/v1")
//!         .with_auth(BearerTokenAuth::new("secret")?)
//!         .with_retry(JitteredBackoff::default())
//!         .rate_limit(TokenBucket::new(10.0, 20)?)
//!         .cache(MemoryCache::default())
//!         .build()?;
//!
//!     let users = client.get("/users")?.error_for_status()?;
//!     println!("{}", users.text());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          HttpClient                             │
//! │  get/post/put/patch/delete → execute(Request) → Response        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────┬───┴─────────┬────────────┬───────────┐
//! │ Middleware │    Retry    │ Rate Limit  │   Cache    │ Transport │
//! ├────────────┼─────────────┼─────────────┼────────────┼───────────┤
//! │ Auth       │ Exponential │ TokenBucket │ MemoryCache│ reqwest   │
//! │ Headers    │ Jittered    │ Per-endpoint│ TTL        │ (blocking)│
//! │ Logging    │ Full jitter │             │ Max size   │           │
//! │ Rate limit │             │             │            │           │
//! └────────────┴─────────────┴─────────────┴────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication strategies
pub mod auth;

/// Request/response models, transport and client
pub mod http;

/// Middleware pipeline and built-in middlewares
pub mod middleware;

/// Retry strategies and the retry loop
pub mod retry;

/// Token bucket rate limiting
pub mod rate_limit;

/// Response caching
pub mod cache;

/// Client configuration
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, ClientConfig};
pub use http::{HttpClient, HttpClientBuilder, Request, Response};
pub use middleware::{Middleware, MiddlewarePipeline};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
