//! Time-boxed read-through cache

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cache entry with its insertion time
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    cached_at: Instant,
}

/// In-memory cache whose entries expire after a fixed TTL.
///
/// Process-local only; a cold cache simply costs one extra upstream call.
/// Keys are request-shaped strings like `commits:owner/repo:10`.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    /// Create a new cache with the given time-to-live
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a value if present and still within the TTL
    pub fn get(&self, key: &str) -> Option<T> {
        let expired = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                Some(entry) if entry.cached_at.elapsed() <= self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
            // A fresh value may have landed between the locks; only evict
            // an entry that is still expired
            if entries
                .get(key)
                .is_some_and(|entry| entry.cached_at.elapsed() > self.ttl)
            {
                entries.remove(key);
            }
        }

        None
    }

    /// Insert or overwrite a value
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Remove a single entry
    pub fn remove(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).map(|e| e.value)
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of entries, including any not yet evicted
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
        cache.insert("commits:acme/api:10", "payload".to_string());

        assert_eq!(
            cache.get("commits:acme/api:10").as_deref(),
            Some("payload")
        );
        assert!(cache.get("commits:acme/api:20").is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(0));
        cache.insert("k", 7);

        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k").is_none());
        // Expired entry is dropped on the failed read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_refreshes_value() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", 1);
        cache.insert("k", 2);

        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_never_discards_a_fresh_entry() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let cache: Arc<TtlCache<u32>> = Arc::new(TtlCache::new(Duration::from_millis(25)));
        let stop = Arc::new(AtomicBool::new(false));

        // Hammer the eviction path while fresh values land on the same key
        let reader = {
            let cache = Arc::clone(&cache);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let _ = cache.get("k");
                }
            })
        };

        for i in 0..50 {
            // Let the previous entry expire so concurrent gets observe it
            std::thread::sleep(Duration::from_millis(35));
            cache.insert("k", i);
            assert_eq!(cache.get("k"), Some(i));
        }

        stop.store(true, Ordering::Relaxed);
        reader.join().unwrap();
    }

    #[test]
    fn test_remove_and_clear() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.remove("a"), Some(1));
        assert!(cache.get("a").is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
