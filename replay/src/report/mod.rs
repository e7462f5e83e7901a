//! @ai:module:intent Report rendering for replay results
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_report, JsonReporter, JsonReporterTrait

pub mod json_report;
pub mod text_report;

pub use json_report::{JsonReporter, JsonReporterTrait};

use crate::metrics::ReplayReport;
use anyhow::{Context, Result};
use clap::ValueEnum;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Render a replay report in the requested format
/// @ai:effects pure
pub fn format_report(report: &ReplayReport, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(report),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(report),
        OutputFormat::Text => return Ok(text_report::format_text(report)),
    };
    rendered.context("Failed to serialize replay report")
}
