// In-memory TTL cache for query results.
// Entries carry their own lifetime and expire lazily on read or during a sweep.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// TTL for search results (global repository search, user search).
pub const SEARCH_TTL: Duration = Duration::from_secs(10 * 60);

/// TTL for listings (organizations, user repositories, profiles).
pub const LISTING_TTL: Duration = Duration::from_secs(60 * 60);

/// A cached value with its storage time and lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value, stored as JSON so one cache serves every result type.
    pub data: serde_json::Value,
    /// When the value was stored.
    pub stored_at: DateTime<Utc>,
    /// How long the value stays valid.
    pub ttl: Duration,
}

impl CacheEntry {
    fn new(data: serde_json::Value, ttl: Duration) -> Self {
        Self {
            data,
            stored_at: Utc::now(),
            ttl,
        }
    }

    /// Check if this entry has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now
            .signed_duration_since(self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed > self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Process-wide key/value cache with per-entry TTL.
///
/// Unbounded. The only eviction is expiry, applied lazily by [`TtlCache::get`]
/// and proactively by [`TtlCache::sweep`].
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value under `key` if present and unexpired.
    ///
    /// An expired entry is removed. A value whose shape does not match `T`
    /// is treated as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            let entry = entries.get(key)?;
            if entry.is_expired() {
                None
            } else {
                Some(entry.data.clone())
            }
        };

        let Some(data) = data else {
            self.evict_if_expired(key);
            debug!(key, "cache entry expired");
            return None;
        };

        match serde_json::from_value(data) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "cached value has unexpected shape");
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any existing entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                debug!(key, error = %e, "value not cacheable");
                return;
            }
        };

        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), CacheEntry::new(data, ttl));
    }

    /// Remove every expired entry, returning how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A concurrent `set` may have refreshed the entry between the read and
    // this write, so re-check before removing.
    fn evict_if_expired(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(CacheEntry::is_expired) {
            entries.remove(key);
        }
    }
}
