//! In-process cache with TTL and a size bound

use super::{Cache, DEFAULT_MAX_SIZE};
use crate::error::{Error, Result};
use crate::http::Response;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug)]
struct Entry {
    response: Response,
    expires_at: Option<Instant>,
    seq: u64,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
pub(super) struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

impl Inner {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Evict the entry closest to expiry; entries without expiry go last and
    /// ties go to the oldest insert.
    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.expires_at.is_none(), e.expires_at, e.seq))
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            debug!(key = %key, "evicting cache entry");
            self.entries.remove(&key);
        }
    }
}

/// Thread-safe in-memory response cache
#[derive(Debug)]
pub struct MemoryCache {
    pub(super) inner: Mutex<Inner>,
    default_ttl: Option<Duration>,
    max_size: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            default_ttl: None,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl MemoryCache {
    /// Create a cache holding at most `max_size` entries
    pub fn new(default_ttl: Option<Duration>, max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(Error::config("cache max_size must be positive"));
        }
        Ok(Self {
            inner: Mutex::new(Inner::default()),
            default_ttl,
            max_size,
        })
    }

    /// Number of stored entries, expired ones included until they are purged
    pub fn size(&self) -> usize {
        self.lock().map_or(0, |inner| inner.entries.len())
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    fn lock(&self) -> Option<MutexGuard<'_, Inner>> {
        match self.inner.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("cache lock poisoned, treating as miss");
                None
            }
        }
    }

    /// Remove `key` if it is expired; returns the live entry otherwise
    fn live<'a>(inner: &'a mut Inner, key: &str, now: Instant) -> Option<&'a Entry> {
        if inner.entries.get(key)?.is_expired(now) {
            inner.entries.remove(key);
            return None;
        }
        inner.entries.get(key)
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Response> {
        let mut inner = self.lock()?;
        let hit = Self::live(&mut inner, key, Instant::now()).map(|e| e.response.clone());
        debug!(key, hit = hit.is_some(), "cache lookup");
        hit
    }

    fn set(&self, key: &str, response: Response, ttl: Option<Duration>) {
        let Some(mut inner) = self.lock() else {
            return;
        };
        let now = Instant::now();

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_size {
            let purged = inner.purge_expired(now);
            if purged > 0 {
                debug!(purged, "purged expired cache entries");
            }
            if inner.entries.len() >= self.max_size {
                inner.evict_one();
            }
        }

        let expires_at = ttl.or(self.default_ttl).and_then(|t| now.checked_add(t));
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_string(),
            Entry {
                response,
                expires_at,
                seq,
            },
        );
    }

    fn delete(&self, key: &str) {
        if let Some(mut inner) = self.lock() {
            inner.entries.remove(key);
        }
    }

    fn clear(&self) {
        if let Some(mut inner) = self.lock() {
            inner.entries.clear();
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.lock()
            .is_some_and(|mut inner| Self::live(&mut inner, key, Instant::now()).is_some())
    }
}
