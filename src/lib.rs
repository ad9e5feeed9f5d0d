//! Support Mesh - multi-agent customer service orchestration
//!
//! A router agent splits a free-text customer request into ordered intents,
//! a data agent serves each one through a JSON-RPC tool server, and a
//! support agent writes the reply. Every hand-off is recorded in a
//! per-request agent-to-agent (A2A) log.
//!
//! ## Quick Start
//!
//! ```bash
//! # Ask one question (spawns the configured tool server)
//! support-mesh ask "Get customer information for ID 5"
//!
//! # Run the built-in scenarios over one connection
//! support-mesh scenarios --format json
//! ```

pub mod a2a;
pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod router;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{FailureKind, IntentFailure};
pub use router::{Request, Router, RouterOutcome};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
