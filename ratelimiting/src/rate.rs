//! @ai:module:intent Validated refill configuration for a token bucket
//! @ai:module:layer domain
//! @ai:module:public_api RateLimit
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::period::{format_period, serde_iso8601};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// @ai:intent Number of tokens that fully refill an empty bucket over one period
/// @ai:invariant tokens_per_period > 0 and period > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRateLimit", into = "RawRateLimit")]
pub struct RateLimit {
    tokens_per_period: u32,
    period: Duration,
}

impl RateLimit {
    /// @ai:intent Create a rate limit, rejecting values that would divide by zero or never refill
    /// @ai:pre tokens_per_period > 0, period > 0
    /// @ai:example (10, 1s) -> Ok(RateLimit)
    /// @ai:example (10, 0s) -> Err(InvalidArgument("period"))
    /// @ai:effects pure
    pub fn new(tokens_per_period: u32, period: Duration) -> Result<Self> {
        if tokens_per_period == 0 {
            return Err(Error::invalid_argument(
                "tokens_per_period",
                "must be greater than zero",
            ));
        }
        if period.is_zero() {
            return Err(Error::invalid_argument("period", "must be greater than zero"));
        }

        Ok(Self {
            tokens_per_period,
            period,
        })
    }

    pub fn tokens_per_period(&self) -> u32 {
        self.tokens_per_period
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// @ai:intent Bucket ceiling for this limit
    /// @ai:effects pure
    pub fn capacity(&self) -> f64 {
        f64::from(self.tokens_per_period)
    }

    /// @ai:intent Period length in fractional milliseconds
    /// @ai:effects pure
    pub fn period_millis(&self) -> f64 {
        self.period.as_secs_f64() * 1_000.0
    }
}

/// Unvalidated serde shape of a rate limit
#[derive(Serialize, Deserialize)]
struct RawRateLimit {
    tokens_per_period: u32,
    #[serde(with = "serde_iso8601")]
    period: Duration,
}

impl TryFrom<RawRateLimit> for RateLimit {
    type Error = Error;

    fn try_from(raw: RawRateLimit) -> Result<Self> {
        Self::new(raw.tokens_per_period, raw.period)
    }
}

impl From<RateLimit> for RawRateLimit {
    fn from(limit: RateLimit) -> Self {
        Self {
            tokens_per_period: limit.tokens_per_period,
            period: limit.period,
        }
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tokens_per_period, format_period(self.period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_positive_values() {
        let limit = RateLimit::new(45, Duration::from_secs(1)).unwrap();
        assert_eq!(limit.tokens_per_period(), 45);
        assert_eq!(limit.capacity(), 45.0);
        assert_eq!(limit.period_millis(), 1_000.0);
    }

    #[test]
    fn test_new_rejects_zero_tokens() {
        let err = RateLimit::new(0, Duration::from_secs(1)).unwrap_err();
        assert!(err.is_invalid_argument("tokens_per_period"));
    }

    #[test]
    fn test_new_rejects_zero_period() {
        let err = RateLimit::new(1, Duration::ZERO).unwrap_err();
        assert!(err.is_invalid_argument("period"));
    }

    #[test]
    fn test_display() {
        let limit = RateLimit::new(100, Duration::from_secs(60)).unwrap();
        assert_eq!(limit.to_string(), "100/PT1M");
    }

    #[test]
    fn test_serde_uses_iso8601_period() {
        let limit = RateLimit::new(5, Duration::from_secs(90)).unwrap();
        let json = serde_json::to_string(&limit).unwrap();
        assert_eq!(json, r#"{"tokens_per_period":5,"period":"PT1M30S"}"#);

        let back: RateLimit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, limit);
    }

    #[test]
    fn test_deserialize_validates() {
        let result: std::result::Result<RateLimit, _> =
            serde_json::from_str(r#"{"tokens_per_period":0,"period":"PT1S"}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("tokens_per_period"));
    }
}
