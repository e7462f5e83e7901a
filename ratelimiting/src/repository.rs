//! @ai:module:intent Resolve token buckets by rate-limit identity through a shared cache
//! @ai:module:layer application
//! @ai:module:public_api TokenBucketRepository, TokenBucketRepositoryTrait
//! @ai:module:depends_on bucket, cache, period, rate
//! @ai:module:stateless true
//!
//! The repository owns no state of its own. Each `(name, period)` pair maps to
//! one cache entry holding a [`SharedBucket`]; expiry of that entry is up to
//! the cache.

use crate::bucket::{SharedBucket, TokenBucket};
use crate::cache::{CacheKey, CacheKeyBuilder, CacheTrait};
use crate::error::{Error, Result};
use crate::period::format_period;
use crate::rate::RateLimit;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// @ai:intent Trait for looking up and storing token buckets by name and period
pub trait TokenBucketRepositoryTrait: Send + Sync {
    /// @ai:intent Return the bucket for (name, period), creating a full one on first access
    /// @ai:post repeated calls with the same (name, period) return the same instance
    /// @ai:effects state:write, time
    fn find_by_name_and_period(&self, name: &str, limit: &RateLimit) -> Result<SharedBucket> {
        self.find_by_name_and_period_at(name, limit, Utc::now())
    }

    /// @ai:intent Same as find_by_name_and_period, stamping a newly created bucket with `now`
    fn find_by_name_and_period_at(
        &self,
        name: &str,
        limit: &RateLimit,
        now: DateTime<Utc>,
    ) -> Result<SharedBucket>;

    /// @ai:intent Store `bucket` under (name, period), replacing any existing bucket
    /// @ai:pre period > 0
    fn save(&self, name: &str, period: Duration, bucket: SharedBucket) -> Result<()>;
}

/// @ai:intent Cache-backed token bucket repository
pub struct TokenBucketRepository<C> {
    cache: Arc<C>,
    keys: CacheKeyBuilder<Mutex<TokenBucket>>,
}

impl<C: CacheTrait> TokenBucketRepository<C> {
    /// @ai:intent Create a repository over a cache that may be shared with other users
    /// @ai:effects pure
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            keys: CacheKeyBuilder::new(),
        }
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// @ai:intent Build the cache key for a bucket identity
    /// @ai:example ("login", 60s) -> Mutex<TokenBucket>["login", "PT1M"]
    /// @ai:effects pure
    pub fn bucket_key(&self, name: &str, period: Duration) -> Result<CacheKey> {
        if period.is_zero() {
            return Err(Error::invalid_argument("period", "must be greater than zero"));
        }

        Ok(self.keys.key([name.to_string(), format_period(period)]))
    }

    /// @ai:intent Take one token from the bucket for (name, limit) at the current time
    /// @ai:effects state:write, time
    pub fn try_acquire(&self, name: &str, limit: &RateLimit) -> Result<bool> {
        self.try_acquire_at(name, limit, Utc::now())
    }

    /// @ai:intent Take one token from the bucket for (name, limit) at `now`
    /// @ai:effects state:write
    pub fn try_acquire_at(&self, name: &str, limit: &RateLimit, now: DateTime<Utc>) -> Result<bool> {
        let bucket = self.find_by_name_and_period_at(name, limit, now)?;
        let allowed = bucket.lock().try_take_token_at(limit, now);
        Ok(allowed)
    }
}

impl<C: CacheTrait> TokenBucketRepositoryTrait for TokenBucketRepository<C> {
    /// @ai:intent Resolve or create the bucket; `limit` sizes only a newly created bucket
    /// @ai:effects state:write
    /// @ai:edge_cases existing bucket -> returned unchanged, capacity adjusts on its next refill
    fn find_by_name_and_period_at(
        &self,
        name: &str,
        limit: &RateLimit,
        now: DateTime<Utc>,
    ) -> Result<SharedBucket> {
        let key = self.bucket_key(name, limit.period())?;

        self.cache.get_or_create(&key, || {
            tracing::debug!(bucket = name, %limit, "creating token bucket");
            Mutex::new(TokenBucket::with_last_checked(limit.tokens_per_period(), now))
        })
    }

    /// @ai:effects state:write
    fn save(&self, name: &str, period: Duration, bucket: SharedBucket) -> Result<()> {
        let key = self.bucket_key(name, period)?;
        self.cache.put(key, bucket)
    }
}
