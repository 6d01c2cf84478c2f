//! Cached response storage.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use dashmap::DashMap;

use crate::observability::metrics;

/// Key of the entry holding the last upstream-observed avatar URL.
///
/// Route keys always start with `/`, so this can never collide with one.
pub const AVATAR_KEY: &str = "VIRTUAL_KEY_AVATAR";

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// One cached payload. Entries are replaced whole, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Response bytes exactly as served to clients.
    pub payload: Bytes,
    /// Creation time (milliseconds since epoch).
    pub created_at: u64,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            created_at: now_millis(),
        }
    }

    /// Milliseconds since this entry was written.
    pub fn age_ms(&self) -> u64 {
        now_millis().saturating_sub(self.created_at)
    }
}

/// A thread-safe map from cache key to entry.
///
/// Locks are per shard and held only for the map operation itself.
#[derive(Clone, Default)]
pub struct CacheStore {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl CacheStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the entry for `key`.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Replace the entry for `key`.
    pub fn put(&self, key: &str, entry: CacheEntry) {
        self.inner.insert(key.to_string(), entry);
        metrics::record_cache_size(self.inner.len());
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of entries, the avatar entry included.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
