//! @ai:module:intent Aggregate replay decisions into per-limit statistics
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, MetricsAggregatorTrait
//! @ai:module:stateless true

use crate::metrics::types::{Decision, LimitStats, ReplaySummary};
use std::collections::{BTreeMap, BTreeSet};

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Aggregate decisions into a summary
    fn aggregate(&self, decisions: &[Decision]) -> ReplaySummary;
}

/// @ai:intent Aggregates decisions into allow/deny counts per limit
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:intent Count decisions per limit, ordered by limit name
    /// @ai:post summary.requests == decisions.len()
    /// @ai:effects pure
    fn aggregate(&self, decisions: &[Decision]) -> ReplaySummary {
        let mut by_limit: BTreeMap<&str, (LimitStats, BTreeSet<&str>)> = BTreeMap::new();

        for decision in decisions {
            let (stats, keys) = by_limit.entry(decision.limit.as_str()).or_insert_with(|| {
                let stats = LimitStats {
                    limit: decision.limit.clone(),
                    ..Default::default()
                };
                (stats, BTreeSet::new())
            });

            stats.requests += 1;
            if decision.allowed {
                stats.allowed += 1;
            } else {
                stats.denied += 1;
            }
            keys.insert(decision.key.as_str());
        }

        let by_limit: Vec<LimitStats> = by_limit
            .into_values()
            .map(|(stats, keys)| {
                LimitStats {
                    keys: keys.len() as u64,
                    ..stats
                }
                .finish()
            })
            .collect();

        ReplaySummary {
            requests: by_limit.iter().map(|s| s.requests).sum(),
            allowed: by_limit.iter().map(|s| s.allowed).sum(),
            denied: by_limit.iter().map(|s| s.denied).sum(),
            by_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decision(limit: &str, key: &str, allowed: bool) -> Decision {
        Decision {
            offset_ms: 0,
            limit: limit.to_string(),
            key: key.to_string(),
            allowed,
            tokens_left: 0,
        }
    }

    #[test]
    fn test_aggregate_empty() {
        let summary = MetricsAggregator::new().aggregate(&[]);
        assert_eq!(summary, ReplaySummary::default());
        assert!(!summary.has_denials());
    }

    #[test]
    fn test_aggregate_counts_per_limit() {
        let decisions = vec![
            decision("login", "alice", true),
            decision("api", "alice", true),
            decision("api", "bob", false),
            decision("api", "alice", false),
            decision("login", "alice", false),
        ];

        let summary = MetricsAggregator::new().aggregate(&decisions);

        assert_eq!(summary.requests, 5);
        assert_eq!(summary.allowed, 2);
        assert_eq!(summary.denied, 3);
        assert!(summary.has_denials());

        let api = &summary.by_limit[0];
        assert_eq!(api.limit, "api");
        assert_eq!(api.requests, 3);
        assert_eq!(api.denied, 2);
        assert_eq!(api.keys, 2);
        assert!((api.denial_rate - 66.666).abs() < 0.01);

        let login = &summary.by_limit[1];
        assert_eq!(login.limit, "login");
        assert_eq!(login.keys, 1);
        assert_eq!(login.denial_rate, 50.0);
    }
}
