//! In-memory TTL cache for upstream results.
//!
//! Each gateway domain (geocoding, crawling) owns an independent cache
//! instance. Entries expire after a per-entry TTL; eviction is lazy on
//! read, with an explicit sweep available to bound memory. Keys are
//! SHA-256 digests of the normalized request signature (see [`key`]).

pub mod key;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A single cache entry with its insertion time and time-to-live.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// Generic in-memory key/value cache with per-entry expiry.
///
/// Reads take the write lock only when they need to evict, so concurrent
/// lookups do not serialize each other. `clear` is atomic from the
/// caller's view: a concurrent `get` observes either the old or the
/// cleared state, never a partial mix. Concurrent `set` on the same key
/// is last-write-wins, which is fine for idempotent remote results.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache whose `set` calls use `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), default_ttl }
    }

    /// Look up a key, returning a clone of the value on a fresh hit.
    ///
    /// Expired and corrupt (zero-TTL) entries are removed and reported
    /// as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.ttl > Duration::ZERO && !entry.is_expired(now) => {
                    return Some(entry.value.clone());
                }
                Some(entry) => {
                    if entry.ttl == Duration::ZERO {
                        tracing::warn!(key, "corrupt cache entry with zero TTL, treating as miss");
                    }
                }
            }
        }

        // Expired or corrupt: evict under the write lock, re-checking in
        // case a concurrent set refreshed the entry in the meantime.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(key) {
            if entry.ttl > Duration::ZERO && !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Insert a value with the cache's default TTL.
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Insert a value with an explicit TTL. A zero TTL is refused.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        if ttl == Duration::ZERO {
            tracing::warn!(key, "refusing to cache entry with zero TTL");
            return;
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), CacheEntry { value, inserted_at: Instant::now(), ttl });
        tracing::debug!(key, cache_size = entries.len(), "cached entry");
    }

    /// Remove all entries, returning how many were dropped.
    ///
    /// Idempotent: clearing an empty cache succeeds and returns 0.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of entries currently stored, including not-yet-evicted
    /// expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry whose value matches `predicate`, returning how
    /// many were dropped. Keys are hashes, so value-level selectors (a
    /// stored URL, say) are the only way to target a subset.
    pub fn remove_where(&self, predicate: impl Fn(&V) -> bool) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !predicate(&entry.value));
        before - entries.len()
    }

    /// Sweep expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.ttl > Duration::ZERO && !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Default TTL applied by `set`.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
