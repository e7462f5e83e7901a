//! @ai:module:intent Metric types for replay results
//! @ai:module:layer domain
//! @ai:module:public_api Decision, LimitStats, ReplaySummary, ReplayReport
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// @ai:intent Outcome of one replayed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub offset_ms: u64,
    pub limit: String,
    pub key: String,
    pub allowed: bool,
    /// Whole tokens left in the bucket after the decision
    pub tokens_left: u32,
}

/// @ai:intent Allow/deny counts for one limit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitStats {
    pub limit: String,
    pub requests: u64,
    pub allowed: u64,
    pub denied: u64,
    /// Distinct keys seen under this limit
    pub keys: u64,
    /// Percentage of requests denied, 0.0 when there were none
    pub denial_rate: f64,
}

/// @ai:intent Totals across all limits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub requests: u64,
    pub allowed: u64,
    pub denied: u64,
    pub by_limit: Vec<LimitStats>,
}

/// @ai:intent Complete result of a replay run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub generated_at: String,
    pub start: String,
    pub summary: ReplaySummary,
    pub decisions: Vec<Decision>,
}

impl ReplaySummary {
    /// @ai:intent Check whether any request was denied
    /// @ai:effects pure
    pub fn has_denials(&self) -> bool {
        self.denied > 0
    }
}

impl LimitStats {
    /// @ai:intent Recompute the denial rate from the counts
    /// @ai:effects pure
    pub(crate) fn finish(mut self) -> Self {
        self.denial_rate = if self.requests == 0 {
            0.0
        } else {
            (self.denied as f64 / self.requests as f64) * 100.0
        };
        self
    }
}
