//! @ai:module:intent Single replayed request and trace parse errors
//! @ai:module:layer domain
//! @ai:module:public_api Request, TraceError
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Joins limit and key in a bucket name. Limit names never contain it.
pub const BUCKET_SEPARATOR: char = ':';

/// @ai:intent One request in a trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Milliseconds since the start of the replay
    pub offset_ms: u64,
    /// Name of the configured limit that applies
    pub limit: String,
    /// Caller identity the limit is tracked per (client id, IP, user, ...)
    pub key: String,
}

impl Request {
    /// @ai:effects pure
    pub fn new(offset_ms: u64, limit: &str, key: &str) -> Self {
        Self {
            offset_ms,
            limit: limit.to_string(),
            key: key.to_string(),
        }
    }

    /// @ai:intent Name of the bucket this request draws from
    /// @ai:pre limit does not contain BUCKET_SEPARATOR, so the name splits back uniquely
    /// @ai:example (limit "api", key "10.0.0.1") -> "api:10.0.0.1"
    /// @ai:effects pure
    pub fn bucket_name(&self) -> String {
        format!("{}{}{}", self.limit, BUCKET_SEPARATOR, self.key)
    }
}

/// @ai:intent Errors produced while parsing a trace
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    #[error("line {line}: expected `<offset_ms> <limit> <key>`, found {found:?}")]
    Malformed { line: usize, found: String },

    #[error("line {line}: invalid offset {value:?}")]
    InvalidOffset { line: usize, value: String },

    #[error("line {line}: offset {offset} ms precedes the previous request at {previous} ms")]
    OutOfOrder {
        line: usize,
        offset: u64,
        previous: u64,
    },
}
