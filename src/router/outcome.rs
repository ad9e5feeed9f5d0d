//! What a routed request produces.

use super::intent::{Intent, PlanShape};
use crate::a2a::A2aMessage;
use crate::agents::Record;
use crate::error::IntentFailure;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Result slot for one intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntentOutcome {
    Completed { record: Record },
    Failed { failure: IntentFailure },
}

impl IntentOutcome {
    pub fn failed(failure: IntentFailure) -> Self {
        Self::Failed { failure }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn failure(&self) -> Option<&IntentFailure> {
        match self {
            Self::Failed { failure } => Some(failure),
            Self::Completed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every intent succeeded.
    Completed,
    /// Some intents succeeded, others failed.
    Partial,
    /// No intent succeeded, or a failed customer lookup blocked the intents
    /// that depended on it. A failure of the first intent alone does not make
    /// the request failed when later independent intents succeed.
    Failed,
    /// No intent was recognized; the response asks the customer to rephrase.
    Clarification,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Clarification => "clarification",
        };
        f.write_str(s)
    }
}

/// The response plus the full trace of how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct RouterOutcome {
    pub request_id: Uuid,
    pub status: OutcomeStatus,
    pub shape: PlanShape,
    pub response: String,
    pub intents: Vec<Intent>,
    /// One slot per intent, same order as `intents`.
    pub results: Vec<IntentOutcome>,
    pub log: Vec<A2aMessage>,
}
