//! Append-only A2A log owned by one request.
//!
//! The router creates a fresh log per request, lends it mutably to each step,
//! and hands the finished sequence back to the caller. Nothing is shared
//! between requests.

use super::types::{A2aMessage, AgentRole};
use chrono::Utc;

#[derive(Debug, Default)]
pub struct A2aLog {
    entries: Vec<A2aMessage>,
}

impl A2aLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; sequence numbers are assigned here and never reused.
    pub fn append(&mut self, from: AgentRole, to: AgentRole, summary: impl Into<String>) -> u64 {
        let seq = self.entries.len() as u64 + 1;
        let message = A2aMessage {
            seq,
            from,
            to,
            summary: summary.into(),
            timestamp: Utc::now(),
        };
        tracing::debug!("A2A: {}", message);
        self.entries.push(message);
        seq
    }

    pub fn entries(&self) -> &[A2aMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<A2aMessage> {
        self.entries
    }
}

/// Render a log as one `[From → To] summary` line per message.
pub fn render(entries: &[A2aMessage]) -> String {
    if entries.is_empty() {
        return "(no agent-to-agent messages)".to_string();
    }
    entries
        .iter()
        .map(|m| format!("{:>3}. {}", m.seq, m))
        .collect::<Vec<_>>()
        .join("\n")
}
