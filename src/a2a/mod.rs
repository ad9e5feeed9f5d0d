//! A2A (Agent-to-Agent) coordination record.
//!
//! - [`AgentRole`] — who is talking
//! - [`A2aMessage`] — one sequenced, timestamped request or reply
//! - [`A2aLog`] — the per-request, append-only transcript

pub mod log;
pub mod types;

pub use log::{A2aLog, render};
pub use types::{A2aMessage, AgentRole};
