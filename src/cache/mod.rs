//! Response caching
//!
//! Backends implement [`Cache`]; [`MemoryCache`] keeps responses in process
//! with per-entry TTL and a size bound. Keys come from
//! [`generate_cache_key`], which is stable regardless of parameter order.

mod memory;

pub use memory::MemoryCache;

use crate::error::Result;
use crate::http::Response;
use crate::types::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default bound on the number of cached entries
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// A response store
///
/// Backend failures never reach the caller; they show up as a miss or a
/// no-op.
pub trait Cache: Send + Sync {
    /// Cached response for `key`, if present and not expired
    fn get(&self, key: &str) -> Option<Response>;

    /// Store `response` under `key`; `ttl` of `None` uses the backend default
    fn set(&self, key: &str, response: Response, ttl: Option<Duration>);

    /// Remove `key`
    fn delete(&self, key: &str);

    /// Remove everything
    fn clear(&self);

    /// Whether `key` is present and not expired
    fn exists(&self, key: &str) -> bool;
}

/// Build a cache key such as `GET:https://api.example.com/users?id=1&page=2`
///
/// Parameters are sorted by name so the key does not depend on insertion order.
pub fn generate_cache_key(method: Method, url: &str, params: &HashMap<String, String>) -> String {
    let mut key = format!("{}:{}", method.as_str(), url);
    if !params.is_empty() {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort();
        let query = sorted
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        key.push('?');
        key.push_str(&query);
    }
    key
}

/// Configuration for the in-memory cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL in seconds; `None` keeps entries until evicted
    #[serde(default)]
    pub default_ttl_seconds: Option<u64>,

    /// Maximum number of entries
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: None,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

impl CacheConfig {
    /// Default TTL as a `Duration`
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_seconds.map(Duration::from_secs)
    }

    /// Build a memory cache from this config
    pub fn build(&self) -> Result<MemoryCache> {
        MemoryCache::new(self.default_ttl(), self.max_size)
    }
}
