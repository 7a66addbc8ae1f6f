//! Client configuration
//!
//! Describes a complete client (base URL, auth, retry, rate limiting,
//! caching, logging) in YAML or JSON so it can live outside the code.
//!
//! ```yaml
//! base_url: https://api.example.com/v1
//! timeout_seconds: 10
//! auth:
//!   type: bearer
//!   token: secret
//! retry:
//!   type: jittered
//!   max_retries: 5
//! rate_limit:
//!   rate: 5
//!   capacity: 10
//! cache:
//!   default_ttl_seconds: 300
//! ```

use crate::auth::AuthConfig;
use crate::cache::CacheConfig;
use crate::error::{Error, Result};
use crate::rate_limit::RateLimitConfig;
use crate::retry::RetryConfig;
use crate::types::{LogLevel, StringMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL that relative request paths are joined onto
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent string
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// Authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Retry strategy; no retries when absent
    #[serde(default)]
    pub retry: Option<RetryConfig>,

    /// Rate limiting; unlimited when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,

    /// Response caching; disabled when absent
    #[serde(default)]
    pub cache: Option<CacheConfig>,

    /// Request/response logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: default_timeout(),
            user_agent: None,
            headers: StringMap::new(),
            auth: AuthConfig::None,
            retry: None,
            rate_limit: None,
            cache: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Logging middleware configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Install a `LoggingMiddleware`
    #[serde(default)]
    pub enabled: bool,

    /// Level to log at
    #[serde(default)]
    pub level: LogLevel,
}

impl ClientConfig {
    /// Parse from YAML and validate
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse client config YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON and validate
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse client config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Check every section, naming the offending field on failure
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            let url = Url::parse(base_url)
                .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::invalid_value(
                    "base_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be positive"));
        }
        self.auth
            .build_strategy()
            .map_err(|e| Error::invalid_value("auth", e.to_string()))?;
        if let Some(retry) = &self.retry {
            retry
                .build()
                .map_err(|e| Error::invalid_value("retry", e.to_string()))?;
        }
        if let Some(rate_limit) = &self.rate_limit {
            rate_limit.validate()?;
        }
        if let Some(cache) = &self.cache {
            if cache.max_size == 0 {
                return Err(Error::invalid_value("cache.max_size", "must be positive"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load a client config from a `.yaml`/`.yml` or `.json` file
pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!("Config file '{}' not found", path.display()))
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => ClientConfig::from_json_str(&content),
        Some("yaml" | "yml") | None => ClientConfig::from_yaml_str(&content),
        Some(other) => Err(Error::config(format!(
            "Unsupported config format '.{other}' for '{}'",
            path.display()
        ))),
    }
}
