//! Auth configuration types
//!
//! These types describe authentication declaratively (e.g. from a YAML
//! client config) and are turned into strategies with `build_strategy`.

use super::strategies::{ApiKeyAuth, AuthStrategy, BasicAuth, BearerTokenAuth, CustomHeadersAuth};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Location for API key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Place in HTTP header
    #[default]
    Header,
    /// Place in query parameter
    Query,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// HTTP Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        #[serde(default)]
        password: String,
    },

    /// API Key authentication (header or query)
    ApiKey {
        /// Where to place the API key
        #[serde(default)]
        location: Location,
        /// Header or query parameter name
        #[serde(default)]
        name: Option<String>,
        /// Prefix to add before the value (e.g., "Token ")
        #[serde(default)]
        prefix: Option<String>,
        /// The API key value
        value: String,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: HashMap<String, String>,
    },
}

impl AuthConfig {
    /// Build the strategy described by this config (`None` for no auth)
    pub fn build_strategy(&self) -> Result<Option<Arc<dyn AuthStrategy>>> {
        let strategy: Arc<dyn AuthStrategy> = match self {
            AuthConfig::None => return Ok(None),
            AuthConfig::Bearer { token } => Arc::new(BearerTokenAuth::new(token.clone())?),
            AuthConfig::Basic { username, password } => {
                Arc::new(BasicAuth::new(username.clone(), password.clone())?)
            }
            AuthConfig::ApiKey {
                location,
                name,
                prefix,
                value,
            } => {
                let default_name = match location {
                    Location::Header => "X-API-Key",
                    Location::Query => "api_key",
                };
                let mut auth = ApiKeyAuth::new(
                    value.clone(),
                    *location,
                    name.as_deref().unwrap_or(default_name),
                )?;
                if let Some(prefix) = prefix {
                    auth = auth.with_prefix(prefix.clone());
                }
                Arc::new(auth)
            }
            AuthConfig::CustomHeaders { headers } => {
                Arc::new(CustomHeadersAuth::new(headers.clone())?)
            }
        };
        Ok(Some(strategy))
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(matches!(config, AuthConfig::None));
        assert!(config.build_strategy().unwrap().is_none());
    }

    #[test]
    fn test_location_default() {
        assert_eq!(Location::default(), Location::Header);
    }
}
