//! @ai:module:intent Metrics collection and aggregation for replays
//! @ai:module:layer application
//! @ai:module:public_api Decision, LimitStats, ReplaySummary, ReplayReport, MetricsAggregator

pub mod aggregator;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use types::{Decision, LimitStats, ReplayReport, ReplaySummary};
