//! A2A (Agent-to-Agent) message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Participants in a routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Router,
    DataAgent,
    SupportAgent,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Router => "RouterAgent",
            Self::DataAgent => "CustomerDataAgent",
            Self::SupportAgent => "SupportAgent",
        };
        f.write_str(name)
    }
}

/// One logged inter-agent request or reply. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aMessage {
    /// Position in the log, starting at 1.
    pub seq: u64,
    pub from: AgentRole,
    pub to: AgentRole,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for A2aMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} → {}] {}", self.from, self.to, self.summary)
    }
}
