//! @ai:module:intent Replay timestamped request traces through token bucket rate limits
//! @ai:module:layer application
//! @ai:module:public_api config, trace, runner, metrics, report

pub mod config;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod trace;

pub use config::ReplayConfig;
pub use metrics::{Decision, MetricsAggregator, ReplayReport, ReplaySummary};
pub use report::{format_report, OutputFormat};
pub use runner::{create_executor, ReplayExecutor};
pub use trace::{load_trace, Request};
