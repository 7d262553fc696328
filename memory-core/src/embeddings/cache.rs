//! LRU + TTL cache for embedding and concept-extraction results, keyed by a
//! content hash of the input text (spec.md §5 ambient cache; defaults in
//! [`crate::constants::defaults::{CACHE_MAX_SIZE, CACHE_TTL}`]).

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

/// Hash a cache key's content into a stable, fixed-width identifier.
#[must_use]
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Point-in-time counters for cache effectiveness.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub expirations: AtomicU64,
    pub evictions: AtomicU64,
}

impl CacheMetrics {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }
}

/// Thread-safe LRU cache with per-entry expiry.
pub struct ContentCache<V: Clone> {
    entries: Mutex<LruCache<String, Entry<V>>>,
    ttl: Duration,
    pub metrics: CacheMetrics,
}

impl<V: Clone> ContentCache<V> {
    #[must_use]
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            metrics: CacheMetrics::default(),
        }
    }

    /// Look up `key`, returning `None` on a miss or an expired entry (which
    /// is evicted as a side effect).
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.pop(key);
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                self.metrics.expirations.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: String, value: V) {
        let mut entries = self.entries.lock();
        if entries.len() == entries.cap().get() && !entries.contains(&key) {
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
        }
        entries.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_and_order_sensitive() {
        let a = content_hash(&["florglings are turquoise"]);
        let b = content_hash(&["florglings are turquoise"]);
        let c = content_hash(&["florglings", "are turquoise"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn get_put_round_trip_counts_hits_and_misses() {
        let cache: ContentCache<Vec<f32>> = ContentCache::new(10, Duration::from_secs(60));
        assert!(cache.get("missing").is_none());
        cache.put("k".into(), vec![1.0, 2.0]);
        assert_eq!(cache.get("k"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.metrics.hits.load(Ordering::Relaxed), 1);
        assert_eq!(cache.metrics.misses.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss() {
        let cache: ContentCache<i32> = ContentCache::new(10, Duration::from_millis(1));
        cache.put("k".into(), 42);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.metrics.expirations.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn capacity_is_enforced_lru_style() {
        let cache: ContentCache<i32> = ContentCache::new(2, Duration::from_secs(60));
        cache.put("a".into(), 1);
        cache.put("b".into(), 2);
        cache.put("c".into(), 3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
    }
}
