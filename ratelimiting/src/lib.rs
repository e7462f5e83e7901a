//! @ai:module:intent Token bucket rate limiting with buckets persisted in a generic cache
//! @ai:module:layer domain
//! @ai:module:public_api bucket, cache, error, period, rate, repository
//! @ai:module:stateless true
//!
//! # Rate limiting
//!
//! A [`TokenBucket`] refills lazily: each call works out how many tokens the
//! elapsed time is worth and adds them, capped at the limit passed to that
//! call. A [`TokenBucketRepository`] keeps one bucket per `(name, period)`
//! in any [`CacheTrait`] implementation.
//!
//! ## Example
//!
//! ```rust
//! use ratelimiting::{MemoryCache, RateLimit, TokenBucketRepository, TokenBucketRepositoryTrait};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let repo = TokenBucketRepository::new(Arc::new(MemoryCache::new()));
//! let limit = RateLimit::new(2, Duration::from_secs(1)).unwrap();
//!
//! let bucket = repo.find_by_name_and_period("client-42", &limit).unwrap();
//! assert!(bucket.lock().try_take_token(&limit));
//! assert!(bucket.lock().try_take_token(&limit));
//! assert!(!bucket.lock().try_take_token(&limit));
//! ```

pub mod bucket;
pub mod cache;
pub mod error;
pub mod period;
pub mod rate;
pub mod repository;

pub use bucket::{SharedBucket, TokenBucket};
pub use cache::{CacheKey, CacheKeyBuilder, CacheTrait, MemoryCache};
pub use error::{Error, Result};
pub use period::{format_period, parse_period};
pub use rate::RateLimit;
pub use repository::{TokenBucketRepository, TokenBucketRepositoryTrait};
