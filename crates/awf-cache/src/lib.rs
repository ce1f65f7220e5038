// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded LRU result cache with per-kind TTL (`spec.md` §4.6).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Hex-encoded SHA-256 digest of `kind` concatenated with the canonical
/// JSON form of `canonical_args`. Canonicalization relies on `serde_json`'s
/// `Map` being a `BTreeMap`, so object keys serialize in sorted order.
#[must_use]
pub fn compute_key<T: Serialize>(kind: &str, canonical_args: &T) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\0");
    if let Ok(value) = serde_json::to_value(canonical_args) {
        hasher.update(serde_json::to_string(&value).unwrap_or_default().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Point-in-time counters (`spec.md` §4.6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Successful `get` calls.
    pub hits: u64,
    /// `get` calls that found nothing (absent or expired).
    pub misses: u64,
    /// Entries removed to respect `capacity` or an explicit `invalidate`.
    pub evictions: u64,
}

struct Entry {
    value: Value,
    kind: String,
    expires_at: Instant,
}

struct Inner {
    entries: HashMap<String, Entry>,
    /// Least-recently-used order, front = least recently used.
    order: VecDeque<String>,
    stats: CacheStats,
}

/// Bounded least-recently-used cache keyed by `compute_key`'s output.
pub struct ResultCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ResultCache {
    /// Build a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(Inner { entries: HashMap::new(), order: VecDeque::new(), stats: CacheStats::default() }) }
    }

    /// Fetch `key` if present and not expired. Expired entries are removed
    /// and counted as a miss, not a hit.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                let value = entry.value.clone();
                touch(&mut inner.order, key);
                inner.stats.hits += 1;
                Some(value)
            }
            Some(_) => {
                remove(&mut inner, key);
                inner.stats.misses += 1;
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Insert `value` under `key` with the given `kind` (for
    /// kind-scoped invalidation) and `ttl`. A `ttl` of zero stores nothing.
    pub fn set(&self, key: String, value: Value, kind: impl Into<String>, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let expires_at = Instant::now() + ttl;
        if inner.entries.remove(&key).is_some() {
            inner.order.retain(|k| k != &key);
        }
        inner.entries.insert(key.clone(), Entry { value, kind: kind.into(), expires_at });
        inner.order.push_back(key);
        evict_over_capacity(&mut inner, self.capacity);
    }

    /// Remove every entry, or only those of `kind` if given.
    pub fn invalidate(&self, kind: Option<&str>) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let doomed: Vec<String> = match kind {
            Some(k) => inner.entries.iter().filter(|(_, e)| e.kind == k).map(|(key, _)| key.clone()).collect(),
            None => inner.entries.keys().cloned().collect(),
        };
        for key in doomed {
            remove(&mut inner, &key);
            inner.stats.evictions += 1;
        }
    }

    /// Current number of live (not necessarily unexpired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    /// Whether the cache currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of hit/miss/eviction counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().expect("cache mutex poisoned").stats
    }
}

fn touch(order: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        let key = order.remove(pos).expect("position just found");
        order.push_back(key);
    }
}

fn remove(inner: &mut Inner, key: &str) {
    inner.entries.remove(key);
    inner.order.retain(|k| k != key);
}

fn evict_over_capacity(inner: &mut Inner, capacity: usize) {
    while inner.entries.len() > capacity {
        let Some(lru_key) = inner.order.pop_front() else { break };
        inner.entries.remove(&lru_key);
        inner.stats.evictions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_key_is_stable_under_object_key_order() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(compute_key("ApiCall", &a), compute_key("ApiCall", &b));
    }

    #[test]
    fn compute_key_distinguishes_kind() {
        let args = serde_json::json!({"x": 1});
        assert_ne!(compute_key("ApiCall", &args), compute_key("FilterData", &args));
    }

    #[test]
    fn miss_then_hit() {
        let cache = ResultCache::new(10);
        assert!(cache.get("k1").is_none());
        cache.set("k1".to_string(), serde_json::json!(42), "ApiCall", Duration::from_secs(60));
        assert_eq!(cache.get("k1"), Some(serde_json::json!(42)));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn zero_ttl_stores_nothing() {
        let cache = ResultCache::new(10);
        cache.set("k1".to_string(), serde_json::json!(1), "ApiCall", Duration::ZERO);
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_counts_as_miss_and_is_removed() {
        let cache = ResultCache::new(10);
        cache.set("k1".to_string(), serde_json::json!(1), "ApiCall", Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("k1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_respects_lru_order() {
        let cache = ResultCache::new(2);
        cache.set("k1".to_string(), serde_json::json!(1), "ApiCall", Duration::from_secs(60));
        cache.set("k2".to_string(), serde_json::json!(2), "ApiCall", Duration::from_secs(60));
        cache.get("k1"); // k1 now more recently used than k2
        cache.set("k3".to_string(), serde_json::json!(3), "ApiCall", Duration::from_secs(60));
        assert!(cache.get("k2").is_none(), "k2 should have been evicted as least recently used");
        assert!(cache.get("k1").is_some());
        assert!(cache.get("k3").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn invalidate_by_kind_only_removes_matching_entries() {
        let cache = ResultCache::new(10);
        cache.set("k1".to_string(), serde_json::json!(1), "ApiCall", Duration::from_secs(60));
        cache.set("k2".to_string(), serde_json::json!(2), "FilterData", Duration::from_secs(60));
        cache.invalidate(Some("ApiCall"));
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
    }

    #[test]
    fn invalidate_without_kind_clears_everything() {
        let cache = ResultCache::new(10);
        cache.set("k1".to_string(), serde_json::json!(1), "ApiCall", Duration::from_secs(60));
        cache.set("k2".to_string(), serde_json::json!(2), "FilterData", Duration::from_secs(60));
        cache.invalidate(None);
        assert!(cache.is_empty());
    }
}
