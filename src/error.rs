//! Failure taxonomy for a routed request.
//!
//! Every failure that can happen while serving a request is captured per
//! intent and classified into one of four kinds. None of them is fatal to
//! the process; the router records them in the A2A log and the support
//! agent renders them in the final answer.

use crate::agents::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a per-intent failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No intent could be recognized in the request text.
    ParseFailure,
    /// The intent lacked data it needs (customer id, update fields, a verified account).
    MissingPrerequisite,
    /// The tool server answered with an error for this call.
    ToolFailure,
    /// The tool server could not be reached or did not answer in time.
    UpstreamUnavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParseFailure => "parse_failure",
            Self::MissingPrerequisite => "missing_prerequisite",
            Self::ToolFailure => "tool_failure",
            Self::UpstreamUnavailable => "upstream_unavailable",
        };
        f.write_str(s)
    }
}

/// Failure slot recorded for one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl IntentFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MissingPrerequisite, message)
    }
}

impl fmt::Display for IntentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<DataError> for IntentFailure {
    fn from(err: DataError) -> Self {
        let kind = match err {
            DataError::UpstreamUnavailable(_) => FailureKind::UpstreamUnavailable,
            DataError::NotFound(_) | DataError::InvalidArgument(_) | DataError::Tool { .. } => {
                FailureKind::ToolFailure
            }
        };
        Self::new(kind, err.to_string())
    }
}
