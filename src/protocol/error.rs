//! Tool transport errors.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The tool server answered the call with an error object.
    #[error("tool server error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The connection is gone or could not be used.
    #[error("tool server unavailable: {0}")]
    Unavailable(String),

    /// No correlated reply arrived in time.
    #[error("no reply to {tool} within {}ms", .after.as_millis())]
    Timeout { tool: String, after: Duration },

    /// A reply arrived but could not be understood.
    #[error("malformed tool reply: {0}")]
    Protocol(String),
}

impl ToolError {
    /// Infrastructure failures, as opposed to the server rejecting the call.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, Self::Rpc { .. })
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
