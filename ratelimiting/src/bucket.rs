//! @ai:module:intent Lazy-refill token bucket with fractional token accounting
//! @ai:module:layer domain
//! @ai:module:public_api TokenBucket, SharedBucket
//! @ai:module:stateless false
//! @ai:module:thread_safe false
//!
//! Tokens accrue continuously in proportion to the elapsed share of a period
//! and are only truncated to a whole number when read. No timer is involved:
//! every call re-derives the refill from the time since the previous call.
//!
//! A bucket is not synchronized. Callers sharing one across threads go through
//! [`SharedBucket`], which puts a lock around each cached instance.

use crate::rate::RateLimit;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A bucket as stored in a cache: one lock per entry, identity via `Arc::ptr_eq`.
pub type SharedBucket = Arc<Mutex<TokenBucket>>;

/// @ai:intent Current fill state of one rate-limited entity
/// @ai:invariant 0 <= tokens <= capacity of the most recent refill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBucket {
    tokens: f64,
    last_checked: DateTime<Utc>,
}

impl TokenBucket {
    /// @ai:intent Create a bucket holding `starting_tokens`, last checked now
    /// @ai:effects time
    pub fn new(starting_tokens: u32) -> Self {
        Self::with_last_checked(starting_tokens, Utc::now())
    }

    /// @ai:intent Create a bucket holding `starting_tokens`, last checked at the given time
    /// @ai:effects pure
    pub fn with_last_checked(starting_tokens: u32, last_checked: DateTime<Utc>) -> Self {
        Self {
            tokens: f64::from(starting_tokens),
            last_checked,
        }
    }

    /// @ai:intent Wrap the bucket for storage in a cache
    /// @ai:effects pure
    pub fn into_shared(self) -> SharedBucket {
        Arc::new(Mutex::new(self))
    }

    /// Fractional token count as of the last refill.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn last_checked(&self) -> DateTime<Utc> {
        self.last_checked
    }

    /// @ai:intent Refill for time elapsed until now and return the whole tokens available
    /// @ai:effects state:write, time
    pub fn tokens_left(&mut self, limit: &RateLimit) -> u32 {
        self.tokens_left_at(limit, Utc::now())
    }

    /// @ai:intent Refill for time elapsed until `now` and return the whole tokens available
    /// @ai:post result == floor(tokens) after refill
    /// @ai:example (bucket(0, t), 1 per 1s, t + 1s) -> 1
    /// @ai:example (bucket(0, t), 1 per 1s, t + 500ms) -> 0
    /// @ai:effects state:write
    pub fn tokens_left_at(&mut self, limit: &RateLimit, now: DateTime<Utc>) -> u32 {
        self.refill(limit, now);
        self.tokens as u32
    }

    /// @ai:intent Refill until now, then consume one token if a whole token is available
    /// @ai:effects state:write, time
    pub fn try_take_token(&mut self, limit: &RateLimit) -> bool {
        self.try_take_token_at(limit, Utc::now())
    }

    /// @ai:intent Refill until `now`, then consume one token if a whole token is available
    /// @ai:post returns true iff tokens_left_at(limit, now) >= 1; tokens decreased by exactly 1 on true
    /// @ai:effects state:write
    pub fn try_take_token_at(&mut self, limit: &RateLimit, now: DateTime<Utc>) -> bool {
        let has_tokens = self.tokens_left_at(limit, now) >= 1;
        if has_tokens {
            self.tokens -= 1.0;
        }
        has_tokens
    }

    /// @ai:intent Add tokens for the elapsed share of the period and clamp to the current capacity
    /// @ai:effects state:write
    /// @ai:edge_cases now before last_checked -> nothing accrues and last_checked is kept
    /// @ai:edge_cases capacity raised since last call -> new ceiling applies immediately
    fn refill(&mut self, limit: &RateLimit, now: DateTime<Utc>) {
        let elapsed_ms = elapsed_millis(self.last_checked, now);

        if elapsed_ms >= 0.0 {
            self.tokens += elapsed_ms / limit.period_millis() * limit.capacity();
            self.last_checked = now;
        } else {
            tracing::trace!(
                last_checked = %self.last_checked,
                now = %now,
                "clock moved backwards, skipping refill"
            );
        }

        self.tokens = self.tokens.min(limit.capacity());
    }
}

/// @ai:intent Fractional milliseconds from `from` to `to`, negative if `to` is earlier
/// @ai:effects pure
fn elapsed_millis(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000.0,
        None => delta.num_milliseconds() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as TimeDelta;
    use std::time::Duration;

    fn per_second(tokens: u32) -> RateLimit {
        RateLimit::new(tokens, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_tokens_left_returns_initial_tokens() {
        let time = Utc::now();
        for initial in [0, 1, 42] {
            let mut bucket = TokenBucket::with_last_checked(initial, time);
            let left = bucket.tokens_left_at(&per_second(initial.max(1)), time);
            assert_eq!(left, initial);
        }
    }

    #[test]
    fn test_tokens_left_after_full_period_returns_one() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(0, time);
        let left = bucket.tokens_left_at(&per_second(1), time + TimeDelta::seconds(1));
        assert_eq!(left, 1);
    }

    #[test]
    fn test_tokens_left_after_half_period_returns_zero() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(0, time);
        let left = bucket.tokens_left_at(&per_second(1), time + TimeDelta::milliseconds(500));
        assert_eq!(left, 0);
    }

    #[test]
    fn test_tokens_left_keeps_fraction_across_calls() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(0, time);
        let limit = per_second(1);

        let future = time + TimeDelta::milliseconds(500);
        assert_eq!(bucket.tokens_left_at(&limit, future), 0);

        let future = future + TimeDelta::milliseconds(500);
        assert_eq!(bucket.tokens_left_at(&limit, future), 1);
    }

    #[test]
    fn test_tokens_left_does_not_surface_partial_token() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(0, time);
        let limit = per_second(1);

        let future = time + TimeDelta::milliseconds(500);
        bucket.tokens_left_at(&limit, future);

        let future = future + TimeDelta::milliseconds(400);
        assert_eq!(bucket.tokens_left_at(&limit, future), 0);
        assert!((bucket.tokens() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_tokens_left_clamps_to_capacity() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(3, time);
        let left = bucket.tokens_left_at(&per_second(5), time + TimeDelta::hours(1));
        assert_eq!(left, 5);
        assert_eq!(bucket.tokens(), 5.0);
    }

    #[test]
    fn test_lower_capacity_clamps_immediately() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(10, time);
        assert_eq!(bucket.tokens_left_at(&per_second(2), time), 2);
    }

    #[test]
    fn test_refill_updates_last_checked() {
        let time = Utc::now();
        let later = time + TimeDelta::milliseconds(250);
        let mut bucket = TokenBucket::with_last_checked(0, time);
        bucket.tokens_left_at(&per_second(1), later);
        assert_eq!(bucket.last_checked(), later);
    }

    #[test]
    fn test_clock_moving_backwards_does_not_drain_tokens() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(1, time);
        let limit = per_second(2);

        let earlier = time - TimeDelta::seconds(10);
        assert_eq!(bucket.tokens_left_at(&limit, earlier), 1);
        assert_eq!(bucket.last_checked(), time);

        // The skipped call must not let the same interval be counted twice.
        let later = time + TimeDelta::milliseconds(500);
        assert_eq!(bucket.tokens_left_at(&limit, later), 2);
    }

    #[test]
    fn test_try_take_token_with_no_tokens_returns_false() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(0, time);
        assert!(!bucket.try_take_token_at(&per_second(1), time));
    }

    #[test]
    fn test_try_take_token_with_tokens_returns_true() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(1, time);
        assert!(bucket.try_take_token_at(&per_second(1), time));
        assert_eq!(bucket.tokens(), 0.0);
    }

    #[test]
    fn test_try_take_token_with_one_token_but_two_calls_returns_false() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(1, time);
        let limit = per_second(1);
        assert!(bucket.try_take_token_at(&limit, time));
        assert!(!bucket.try_take_token_at(&limit, time));
    }

    #[test]
    fn test_try_take_token_does_not_exceed_capacity() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(1, time);
        let limit = per_second(1);

        let time = time + TimeDelta::seconds(1);
        assert!(bucket.try_take_token_at(&limit, time));
        assert!(!bucket.try_take_token_at(&limit, time));
    }

    #[test]
    fn test_try_take_token_with_larger_maximum_raises_ceiling() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(1, time);
        assert!(bucket.try_take_token_at(&per_second(1), time));

        let time = time + TimeDelta::seconds(1);
        assert!(bucket.try_take_token_at(&per_second(2), time));
        assert!(bucket.try_take_token_at(&per_second(2), time));
        assert!(!bucket.try_take_token_at(&per_second(2), time));
    }

    #[test]
    fn test_try_take_token_failure_keeps_fraction() {
        let time = Utc::now();
        let mut bucket = TokenBucket::with_last_checked(0, time);
        let limit = per_second(4);

        assert!(!bucket.try_take_token_at(&limit, time + TimeDelta::milliseconds(125)));
        assert!(bucket.try_take_token_at(&limit, time + TimeDelta::milliseconds(250)));
    }

    #[test]
    fn test_wall_clock_variants_refill_from_construction() {
        let mut bucket = TokenBucket::new(3);
        let limit = per_second(3);
        assert_eq!(bucket.tokens_left(&limit), 3);
        assert!(bucket.try_take_token(&limit));
        assert!(bucket.tokens_left(&limit) >= 2);
    }

    #[test]
    fn test_snapshot_serializes_state() {
        let time = Utc::now();
        let bucket = TokenBucket::with_last_checked(7, time);
        let json = serde_json::to_string(&bucket).unwrap();
        let restored: TokenBucket = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, bucket);
    }
}
