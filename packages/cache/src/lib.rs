//! # fanout-cache
//!
//! Expiry-aware caching for fanout request decorators.
//!
//! The [`Cache`] trait is the seam between request decorators and storage
//! backends. [`InMemoryCache`] is the bundled backend: a process-local map
//! whose entries expire lazily on access.
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use fanout_cache::{Cache, InMemoryCache};
//!
//! let mut cache = InMemoryCache::new();
//! cache.save("greeting", "hello".to_string(), Duration::from_secs(60));
//! assert_eq!(cache.fetch("greeting"), Some("hello".to_string()));
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A key/value store with per-entry expiry.
///
/// Implementations decide where values live; callers only see the
/// contains/fetch/save contract. Expired entries behave as absent.
pub trait Cache<V> {
    /// Whether a live (non-expired) entry exists for `key`.
    fn contains(&self, key: &str) -> bool;

    /// Fetch a clone of the live entry for `key`, if any.
    fn fetch(&mut self, key: &str) -> Option<V>;

    /// Store `value` under `key`, replacing any prior entry. The entry
    /// expires `ttl` after the save.
    fn save(&mut self, key: &str, value: V, ttl: Duration);
}

struct Entry<V> {
    value: V,
    deadline: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Process-local cache backed by a `HashMap`.
///
/// Expiry is lazy: entries are dropped when an access observes their
/// deadline has passed, not on a timer.
pub struct InMemoryCache<V> {
    entries: HashMap<String, Entry<V>>,
}

impl<V> InMemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of stored entries, including any not yet observed as expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for InMemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Cache<V> for InMemoryCache<V> {
    fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    fn fetch(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return None,
        };

        if expired {
            tracing::debug!(key, "cache entry expired");
            self.entries.remove(key);
            return None;
        }

        tracing::debug!(key, "cache hit");
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn save(&mut self, key: &str, value: V, ttl: Duration) {
        tracing::debug!(key, ttl_secs = ttl.as_secs(), "cache save");
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                deadline: Instant::now() + ttl,
            },
        );
    }
}
