//! Tool protocol client.
//!
//! Agents never talk to the tool-serving process directly; they hold an
//! `Arc<dyn ToolTransport>` and issue one named call at a time. Concrete
//! transports:
//! - [`ToolClient`] — JSON-RPC over any byte stream (line framed)
//! - [`StdioTransport`] — a [`ToolClient`] attached to a spawned process
//! - [`LocalTools`] — an in-process function table

pub mod client;
pub mod error;
pub mod local;
pub mod stdio;
pub mod types;

pub use client::{ClientOptions, ToolClient, WireDialect};
pub use error::{Result, ToolError};
pub use local::LocalTools;
pub use stdio::StdioTransport;
pub use types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCall, error_codes};

use async_trait::async_trait;
use serde_json::Value;

/// Anything that can execute a named tool call and hand back its result.
///
/// Calls are awaited one at a time by their caller; an implementation must
/// return (success, error, or timeout) rather than wait forever.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value>;
}

/// Tool names exposed by the customer data server.
pub mod tools {
    pub const GET_CUSTOMER: &str = "get_customer";
    pub const LIST_CUSTOMERS: &str = "list_customers";
    pub const UPDATE_CUSTOMER: &str = "update_customer";
    pub const CREATE_TICKET: &str = "create_ticket";
    pub const GET_CUSTOMER_HISTORY: &str = "get_customer_history";

    /// Tools with no side effects. Only these may be retried.
    pub fn is_read_only(tool: &str) -> bool {
        matches!(tool, GET_CUSTOMER | LIST_CUSTOMERS | GET_CUSTOMER_HISTORY)
    }
}
