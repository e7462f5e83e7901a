//! @ai:module:intent Define error types for the rate limiting library
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use thiserror::Error;

/// @ai:intent Unified error type for all rate limiting operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("Invalid period {input:?}: {message}")]
    InvalidPeriod { input: String, message: String },

    #[error("Cache key {key} holds {expected}, requested as {requested}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        requested: &'static str,
    },
}

impl Error {
    /// @ai:intent Build an InvalidArgument error for the named argument
    /// @ai:effects pure
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// @ai:intent Check whether this error rejects the named argument
    /// @ai:effects pure
    pub fn is_invalid_argument(&self, name: &str) -> bool {
        matches!(self, Self::InvalidArgument { argument, .. } if *argument == name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
