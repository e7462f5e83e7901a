//! @ai:module:intent Configuration structs for trace replay
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReplayConfig, LimitConfig, CacheConfig
//! @ai:module:stateless true

use crate::trace::BUCKET_SEPARATOR;
use anyhow::{Context, Result};
use ratelimiting::period::{serde_iso8601, serde_iso8601_option};
use ratelimiting::{MemoryCache, RateLimit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// @ai:intent Main configuration for a replay run
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub limits: Vec<LimitConfig>,
}

/// @ai:intent Settings for the in-memory bucket cache
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime as an ISO 8601 duration; entries never expire when unset
    #[serde(
        default,
        with = "serde_iso8601_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ttl: Option<Duration>,
}

/// @ai:intent One named rate limit
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub name: String,
    pub tokens_per_period: u32,
    /// ISO 8601 duration, e.g. "PT1S" or "PT1M"
    #[serde(with = "serde_iso8601")]
    pub period: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            limits: vec![
                LimitConfig::new("api", 10, Duration::from_secs(1)),
                LimitConfig::new("login", 5, Duration::from_secs(60)),
                LimitConfig::new("export", 100, Duration::from_secs(3_600)),
            ],
        }
    }
}

impl LimitConfig {
    /// @ai:effects pure
    pub fn new(name: &str, tokens_per_period: u32, period: Duration) -> Self {
        Self {
            name: name.to_string(),
            tokens_per_period,
            period,
        }
    }

    /// @ai:intent Validate into a RateLimit
    /// @ai:effects pure
    pub fn rate_limit(&self) -> ratelimiting::Result<RateLimit> {
        RateLimit::new(self.tokens_per_period, self.period)
    }
}

impl CacheConfig {
    /// @ai:intent Build the cache described by this config
    /// @ai:effects pure
    pub fn build(&self) -> MemoryCache {
        match self.ttl {
            Some(ttl) => MemoryCache::with_ttl(ttl),
            None => MemoryCache::new(),
        }
    }
}

impl ReplayConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Validate all limits and index them by name
    /// @ai:post every name is non-empty, unique and free of the bucket separator
    /// @ai:effects pure
    pub fn rate_limits(&self) -> Result<BTreeMap<String, RateLimit>> {
        let mut limits = BTreeMap::new();

        for limit in &self.limits {
            if limit.name.trim().is_empty() {
                anyhow::bail!("Limit names must not be empty");
            }
            if limit.name.contains(BUCKET_SEPARATOR) {
                anyhow::bail!(
                    "Limit `{}` must not contain `{}`",
                    limit.name,
                    BUCKET_SEPARATOR
                );
            }

            let rate = limit
                .rate_limit()
                .with_context(|| format!("Invalid limit `{}`", limit.name))?;

            if limits.insert(limit.name.clone(), rate).is_some() {
                anyhow::bail!("Duplicate limit `{}`", limit.name);
            }
        }

        Ok(limits)
    }
}
