//! @ai:module:intent JSON report file output
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter, JsonReporterTrait
//! @ai:module:stateless true

use crate::metrics::ReplayReport;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Write a report to the given path
    fn generate(&self, report: &ReplayReport, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes replay reports as pretty-printed JSON
pub struct JsonReporter;

impl JsonReporter {
    /// @ai:intent Create a new JSON reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:intent Serialize and write the report, creating parent directories
    /// @ai:effects fs:write
    fn generate(&self, report: &ReplayReport, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write report: {}", output_path.display()))?;

        tracing::info!("Report written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Decision, ReplaySummary};
    use tempfile::TempDir;

    #[test]
    fn test_generate_json_report() {
        let reporter = JsonReporter::new();
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out").join("report.json");

        let report = ReplayReport {
            generated_at: "2026-01-19T00:00:00+00:00".to_string(),
            start: "2026-01-19T00:00:00+00:00".to_string(),
            summary: ReplaySummary::default(),
            decisions: vec![Decision {
                offset_ms: 42,
                limit: "export".to_string(),
                key: "carol".to_string(),
                allowed: false,
                tokens_left: 0,
            }],
        };

        reporter.generate(&report, &output).unwrap();
        assert!(output.exists());

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("\"offset_ms\": 42"));
        assert!(content.contains("\"key\": \"carol\""));
    }
}
