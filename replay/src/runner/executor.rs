//! @ai:module:intent Replay trace requests against token bucket limits
//! @ai:module:layer application
//! @ai:module:public_api ReplayExecutor, create_executor
//! @ai:module:stateless false

use crate::config::ReplayConfig;
use crate::metrics::{Decision, MetricsAggregator, MetricsAggregatorTrait, ReplayReport};
use crate::trace::Request;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ratelimiting::{MemoryCache, RateLimit, TokenBucketRepository, TokenBucketRepositoryTrait};
use std::collections::BTreeMap;
use std::sync::Arc;

/// @ai:intent Executes requests in order, deciding each against its limit's bucket
pub struct ReplayExecutor<R: TokenBucketRepositoryTrait> {
    repository: Arc<R>,
    limits: BTreeMap<String, RateLimit>,
    start: DateTime<Utc>,
}

impl<R: TokenBucketRepositoryTrait> ReplayExecutor<R> {
    /// @ai:intent Create a new replay executor
    /// @ai:effects pure
    pub fn new(repository: Arc<R>, limits: BTreeMap<String, RateLimit>, start: DateTime<Utc>) -> Self {
        Self {
            repository,
            limits,
            start,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// @ai:intent Decide a single request at start + offset and persist the bucket
    /// @ai:pre request.limit names a configured limit
    /// @ai:effects state:write
    pub fn execute(&self, request: &Request) -> Result<Decision> {
        let limit = self
            .limits
            .get(&request.limit)
            .with_context(|| format!("Unknown limit `{}`", request.limit))?;

        let now = i64::try_from(request.offset_ms)
            .ok()
            .and_then(chrono::Duration::try_milliseconds)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .with_context(|| format!("Offset {} ms is out of range", request.offset_ms))?;

        let name = request.bucket_name();
        let bucket = self
            .repository
            .find_by_name_and_period_at(&name, limit, now)?;

        let (allowed, tokens_left) = {
            let mut state = bucket.lock();
            let allowed = state.try_take_token_at(limit, now);
            (allowed, state.tokens_left_at(limit, now))
        };

        self.repository.save(&name, limit.period(), bucket)?;

        tracing::debug!(
            offset_ms = request.offset_ms,
            bucket = %name,
            allowed,
            tokens_left,
            "replayed request"
        );

        Ok(Decision {
            offset_ms: request.offset_ms,
            limit: request.limit.clone(),
            key: request.key.clone(),
            allowed,
            tokens_left,
        })
    }

    /// @ai:intent Decide every request in trace order
    /// @ai:effects state:write
    pub fn execute_all(&self, requests: &[Request]) -> Result<Vec<Decision>> {
        let mut decisions = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            let decision = self
                .execute(request)
                .with_context(|| format!("Request #{} failed", index + 1))?;
            decisions.push(decision);
        }

        tracing::info!("Replayed {} requests", decisions.len());
        Ok(decisions)
    }

    /// @ai:intent Replay all requests and summarize the outcome
    /// @ai:effects state:write, time
    pub fn replay(&self, requests: &[Request]) -> Result<ReplayReport> {
        let decisions = self.execute_all(requests)?;
        let summary = MetricsAggregator::new().aggregate(&decisions);

        Ok(ReplayReport {
            generated_at: Utc::now().to_rfc3339(),
            start: self.start.to_rfc3339(),
            summary,
            decisions,
        })
    }
}

/// @ai:intent Create an executor over a fresh cache built from config
/// @ai:effects pure
pub fn create_executor(
    config: &ReplayConfig,
    start: DateTime<Utc>,
) -> Result<ReplayExecutor<TokenBucketRepository<MemoryCache>>> {
    let limits = config.rate_limits()?;
    let repository = TokenBucketRepository::new(Arc::new(config.cache.build()));
    Ok(ReplayExecutor::new(Arc::new(repository), limits, start))
}
