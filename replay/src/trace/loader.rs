//! @ai:module:intent Parse request traces from text files
//! @ai:module:layer infrastructure
//! @ai:module:public_api parse_trace, load_trace
//! @ai:module:stateless true
//!
//! One request per line: `<offset_ms> <limit> <key>`, separated by
//! whitespace. Blank lines and lines starting with `#` are skipped.

use crate::trace::request::{Request, TraceError};
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Parse trace text into requests ordered by offset
/// @ai:post offsets are non-decreasing
/// @ai:effects pure
/// @ai:edge_cases trailing comment after the key -> Malformed
pub fn parse_trace(content: &str) -> std::result::Result<Vec<Request>, TraceError> {
    let mut requests = Vec::new();
    let mut previous = 0u64;

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [offset, limit, key] = fields[..] else {
            return Err(TraceError::Malformed {
                line,
                found: trimmed.to_string(),
            });
        };

        let offset_ms: u64 = offset.parse().map_err(|_| TraceError::InvalidOffset {
            line,
            value: offset.to_string(),
        })?;

        if offset_ms < previous {
            return Err(TraceError::OutOfOrder {
                line,
                offset: offset_ms,
                previous,
            });
        }
        previous = offset_ms;

        requests.push(Request::new(offset_ms, limit, key));
    }

    Ok(requests)
}

/// @ai:intent Read and parse a trace file
/// @ai:pre path exists and is readable
/// @ai:effects fs:read
pub fn load_trace(path: &Path) -> Result<Vec<Request>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file: {}", path.display()))?;

    let requests = parse_trace(&content)
        .with_context(|| format!("Failed to parse trace file: {}", path.display()))?;

    tracing::debug!("Loaded {} requests from {}", requests.len(), path.display());
    Ok(requests)
}
