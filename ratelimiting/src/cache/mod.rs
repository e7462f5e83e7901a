//! @ai:module:intent Generic keyed cache contract and an in-memory implementation
//! @ai:module:layer infrastructure
//! @ai:module:public_api CacheTrait, CacheKey, CacheKeyBuilder, MemoryCache

pub mod key;
pub mod memory;

pub use key::{CacheKey, CacheKeyBuilder};
pub use memory::MemoryCache;

use crate::error::Result;
use std::any::Any;
use std::sync::Arc;

/// @ai:intent Trait for a shared key/value cache holding values of any type
///
/// Values are handed out as `Arc`s, so every caller that resolves the same key
/// sees the same instance until the entry is replaced or evicted. Expiry and
/// eviction are the implementation's business.
pub trait CacheTrait: Send + Sync {
    /// @ai:intent Return the value at `key`, creating and storing it with `factory` if absent
    /// @ai:post factory runs at most once per key under concurrent first access
    /// @ai:pre factory does not access this cache
    /// @ai:effects state:write
    fn get_or_create<T, F>(&self, key: &CacheKey, factory: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T;

    /// @ai:intent Return the value at `key` if present
    /// @ai:effects state:read
    fn get<T>(&self, key: &CacheKey) -> Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync;

    /// @ai:intent Store `value` at `key`, replacing whatever was there
    /// @ai:effects state:write
    fn put<T>(&self, key: CacheKey, value: Arc<T>) -> Result<()>
    where
        T: Any + Send + Sync;

    /// @ai:intent Drop the entry at `key`, returning whether one existed
    /// @ai:effects state:write
    fn remove(&self, key: &CacheKey) -> bool;

    /// @ai:intent Number of live entries; expired ones are not counted
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
