//! Data agent errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Any other error the tool server reported.
    #[error("tool error {code}: {message}")]
    Tool { code: i64, message: String },
}

pub type Result<T> = std::result::Result<T, DataError>;
