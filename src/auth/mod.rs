//! Authentication module
//!
//! Supports: Bearer, Basic, API Key (header or query), Custom Headers
//!
//! Strategies implement `AuthStrategy` and are plugged into the request
//! pipeline through `AuthMiddleware`.

mod strategies;
mod types;

pub use strategies::{
    encode_basic_auth, ApiKeyAuth, AuthStrategy, BasicAuth, BearerTokenAuth, CustomHeadersAuth,
};
pub use types::{AuthConfig, Location};
