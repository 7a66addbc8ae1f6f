//! Authentication strategies
//!
//! Each strategy knows how to put credentials onto a `Request`.

use super::types::Location;
use crate::error::{Error, Result};
use crate::http::Request;
use crate::types::StringMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Applies credentials to outgoing requests
pub trait AuthStrategy: Send + Sync + std::fmt::Debug {
    /// Add credentials to the request
    fn apply(&self, request: Request) -> Result<Request>;
}

/// Short, non-reversible preview of a secret for Debug output
fn preview(secret: &str) -> String {
    if secret.chars().count() > 4 {
        format!("{}...", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

// ============================================================================
// Bearer Token
// ============================================================================

/// `Authorization: Bearer <token>`
#[derive(Clone)]
pub struct BearerTokenAuth {
    token: String,
}

impl BearerTokenAuth {
    /// Create bearer auth; the token is trimmed and must not be empty
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(Error::auth("bearer token must be a non-empty string"));
        }
        Ok(Self { token })
    }
}

impl AuthStrategy for BearerTokenAuth {
    fn apply(&self, mut request: Request) -> Result<Request> {
        request.set_header("Authorization", format!("Bearer {}", self.token));
        Ok(request)
    }
}

impl std::fmt::Debug for BearerTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenAuth")
            .field("token", &preview(&self.token))
            .finish()
    }
}

// ============================================================================
// Basic
// ============================================================================

/// `Authorization: Basic base64(username:password)`
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// Create basic auth; the username must not be empty
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        if username.is_empty() {
            return Err(Error::auth("username cannot be empty"));
        }
        Ok(Self {
            username,
            password: password.into(),
        })
    }
}

/// Encode credentials for the Basic scheme
pub fn encode_basic_auth(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

impl AuthStrategy for BasicAuth {
    fn apply(&self, mut request: Request) -> Result<Request> {
        let encoded = encode_basic_auth(&self.username, &self.password);
        request.set_header("Authorization", format!("Basic {encoded}"));
        Ok(request)
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

// ============================================================================
// API Key
// ============================================================================

/// API key placed in a header or a query parameter
#[derive(Clone)]
pub struct ApiKeyAuth {
    key: String,
    location: Location,
    name: String,
    prefix: Option<String>,
}

impl ApiKeyAuth {
    /// Create API key auth; the key is trimmed and must not be empty
    pub fn new(key: impl Into<String>, location: Location, name: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(Error::auth("API key must be a non-empty string"));
        }
        let name = name.into();
        if name.is_empty() {
            return Err(Error::auth("API key parameter name cannot be empty"));
        }
        Ok(Self {
            key,
            location,
            name,
            prefix: None,
        })
    }

    /// API key in the `X-API-Key` header
    pub fn header(key: impl Into<String>) -> Result<Self> {
        Self::new(key, Location::Header, "X-API-Key")
    }

    /// API key in the `api_key` query parameter
    pub fn query(key: impl Into<String>) -> Result<Self> {
        Self::new(key, Location::Query, "api_key")
    }

    /// Prefix prepended to the key value (e.g. `"Token "`)
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Where the key is placed
    pub fn location(&self) -> Location {
        self.location
    }

    /// Header or query parameter name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl AuthStrategy for ApiKeyAuth {
    fn apply(&self, mut request: Request) -> Result<Request> {
        let value = format!("{}{}", self.prefix.as_deref().unwrap_or(""), self.key);
        match self.location {
            Location::Header => {
                request.set_header(self.name.clone(), value);
            }
            Location::Query => {
                request.params.insert(self.name.clone(), value);
            }
        }
        Ok(request)
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("key", &preview(&self.key))
            .field("location", &self.location)
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// Custom Headers
// ============================================================================

/// Fixed set of credential headers
#[derive(Clone)]
pub struct CustomHeadersAuth {
    headers: StringMap,
}

impl CustomHeadersAuth {
    /// Create custom header auth; at least one header is required
    pub fn new(headers: StringMap) -> Result<Self> {
        if headers.is_empty() {
            return Err(Error::auth("custom header auth needs at least one header"));
        }
        Ok(Self { headers })
    }
}

impl AuthStrategy for CustomHeadersAuth {
    fn apply(&self, mut request: Request) -> Result<Request> {
        for (key, value) in &self.headers {
            request.set_header(key.clone(), value.clone());
        }
        Ok(request)
    }
}

impl std::fmt::Debug for CustomHeadersAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.headers.keys().collect();
        names.sort();
        f.debug_struct("CustomHeadersAuth")
            .field("headers", &names)
            .finish()
    }
}
