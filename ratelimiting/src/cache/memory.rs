//! @ai:module:intent In-process cache backed by a sharded concurrent map
//! @ai:module:layer infrastructure
//! @ai:module:public_api MemoryCache
//! @ai:module:stateless false
//! @ai:module:thread_safe true

use crate::cache::{CacheKey, CacheTrait};
use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::sync::Arc;
use std::time::{Duration, Instant};

type AnyValue = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: AnyValue,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// @ai:intent Concurrent in-memory cache with optional time-to-live per entry
///
/// Expired entries are dropped lazily when their key is next touched, or in
/// bulk through [`MemoryCache::purge_expired`].
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Option<Duration>,
}

impl MemoryCache {
    /// @ai:intent Create a cache whose entries never expire
    /// @ai:effects pure
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Create a cache whose entries expire `ttl` after they were stored
    /// @ai:effects pure
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// @ai:intent Remove every expired entry, returning how many were dropped
    /// @ai:effects state:write, time
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "purged expired cache entries");
        }
        purged
    }

    fn new_entry(&self, value: AnyValue, now: Instant) -> CacheEntry {
        CacheEntry {
            value,
            expires_at: self.ttl.map(|ttl| now + ttl),
        }
    }
}

/// @ai:intent Reject keys whose type tag does not match the requested value type
/// @ai:effects pure
fn ensure_type<T: Any>(key: &CacheKey) -> Result<()> {
    if key.is_for::<T>() {
        Ok(())
    } else {
        Err(type_mismatch::<T>(key))
    }
}

fn type_mismatch<T: Any>(key: &CacheKey) -> Error {
    Error::TypeMismatch {
        key: key.to_string(),
        expected: key.type_name(),
        requested: type_name::<T>(),
    }
}

fn downcast<T: Any + Send + Sync>(key: &CacheKey, value: AnyValue) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| type_mismatch::<T>(key))
}

impl CacheTrait for MemoryCache {
    /// @ai:intent Return the live value at `key` or create it while holding the shard lock
    /// @ai:effects state:write, time
    fn get_or_create<T, F>(&self, key: &CacheKey, factory: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        ensure_type::<T>(key)?;
        let now = Instant::now();

        let value = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    tracing::debug!(%key, "cache entry expired, recreating");
                    occupied.insert(self.new_entry(Arc::new(factory()), now));
                }
                Arc::clone(&occupied.get().value)
            }
            Entry::Vacant(vacant) => {
                let entry = vacant.insert(self.new_entry(Arc::new(factory()), now));
                Arc::clone(&entry.value)
            }
        };

        downcast(key, value)
    }

    /// @ai:effects state:read, time
    fn get<T>(&self, key: &CacheKey) -> Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        ensure_type::<T>(key)?;
        let now = Instant::now();

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));

        let value = self.entries.get(key).map(|entry| Arc::clone(&entry.value));
        value.map(|v| downcast(key, v)).transpose()
    }

    /// @ai:effects state:write, time
    fn put<T>(&self, key: CacheKey, value: Arc<T>) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        ensure_type::<T>(&key)?;
        let entry = self.new_entry(value, Instant::now());
        self.entries.insert(key, entry);
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// @ai:intent Count entries that have not expired yet
    /// @ai:effects state:read, time
    fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn key(parts: &[&str]) -> CacheKey {
        CacheKey::of::<String, _, _>(parts.iter().copied())
    }

    #[test]
    fn test_get_or_create_creates_once() {
        let cache = MemoryCache::new();
        let k = key(&["a"]);

        let first = cache.get_or_create(&k, || "first".to_string()).unwrap();
        let second = cache.get_or_create(&k, || "second".to_string()).unwrap();

        assert_eq!(*first, "first");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_existing_value() {
        let cache = MemoryCache::new();
        let k = key(&["a"]);

        cache.get_or_create(&k, || "old".to_string()).unwrap();
        let replacement = Arc::new("new".to_string());
        cache.put(k.clone(), Arc::clone(&replacement)).unwrap();

        let found: Arc<String> = cache.get(&k).unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &replacement));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let cache = MemoryCache::new();
        let found: Option<Arc<String>> = cache.get(&key(&["missing"])).unwrap();
        assert!(found.is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_mismatched_value_type_is_rejected() {
        let cache = MemoryCache::new();
        let k = key(&["a"]);

        let err = cache.get_or_create(&k, || 7u64).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(cache.put(k.clone(), Arc::new(7u64)).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_values_of_different_types_share_the_cache() {
        let cache = MemoryCache::new();
        let text = CacheKey::of::<String, _, _>(["shared"]);
        let number = CacheKey::of::<u64, _, _>(["shared"]);

        cache.get_or_create(&text, || "text".to_string()).unwrap();
        cache.get_or_create(&number, || 42u64).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(*cache.get::<u64>(&number).unwrap().unwrap(), 42);
    }

    #[test]
    fn test_remove() {
        let cache = MemoryCache::new();
        let k = key(&["a"]);
        cache.put(k.clone(), Arc::new("v".to_string())).unwrap();

        assert!(cache.remove(&k));
        assert!(!cache.remove(&k));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::with_ttl(Duration::ZERO);
        let k = key(&["a"]);

        let first = cache.get_or_create(&k, || "first".to_string()).unwrap();
        let second = cache.get_or_create(&k, || "second".to_string()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*second, "second");

        let found: Option<Arc<String>> = cache.get(&k).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_long_ttl_keeps_entries() {
        let cache = MemoryCache::with_ttl(Duration::from_secs(3_600));
        let k = key(&["a"]);

        let first = cache.get_or_create(&k, || "first".to_string()).unwrap();
        let second = cache.get_or_create(&k, || "second".to_string()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_len_skips_expired_entries() {
        let cache = MemoryCache::with_ttl(Duration::ZERO);
        cache.put(key(&["a"]), Arc::new("a".to_string())).unwrap();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.purge_expired(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let cache = MemoryCache::with_ttl(Duration::ZERO);
        cache.put(key(&["a"]), Arc::new("a".to_string())).unwrap();
        cache.put(key(&["b"]), Arc::new("b".to_string())).unwrap();

        assert_eq!(cache.purge_expired(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_access_creates_one_value() {
        let cache = MemoryCache::new();
        let k = key(&["contended"]);
        let created = AtomicUsize::new(0);
        let threads = 8;
        let barrier = Barrier::new(threads);

        let (cache, k, created_ref, barrier) = (&cache, &k, &created, &barrier);
        let values: Vec<Arc<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_create(k, || {
                                created_ref.fetch_add(1, Ordering::SeqCst);
                                "value".to_string()
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }
}
