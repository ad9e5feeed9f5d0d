//! Wire types for the tool-serving process.
//!
//! The tool server speaks JSON-RPC 2.0 over a line-delimited byte stream.
//! Responses are matched to requests only by `id`; unknown fields in a
//! response are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── JSON-RPC 2.0 ───────────────────────────────────────────

/// JSON-RPC 2.0 request. Notifications carry no `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl JsonRpcRequest {
    /// Create a request that expects a correlated response.
    pub fn call(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    /// Create a fire-and-forget notification.
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 response, read leniently.
///
/// `id` is optional so server-initiated notifications deserialize too; the
/// client drops anything it cannot correlate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Correlation id as issued by this client, if the response carries one.
    ///
    /// Servers echo ids back verbatim, but some stringify numbers.
    pub fn correlation_id(&self) -> Option<u64> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ─── Tool Calls ─────────────────────────────────────────────

/// One tool invocation, tagged with the id its reply must echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub arguments: Value,
    pub correlation_id: u64,
}

impl ToolCall {
    pub fn new(correlation_id: u64, tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
            correlation_id,
        }
    }

    /// `{"method": "<tool>", "params": <arguments>}`
    pub fn direct_request(&self) -> JsonRpcRequest {
        JsonRpcRequest::call(self.correlation_id, self.tool.clone(), self.arguments.clone())
    }

    /// MCP `tools/call` with `{name, arguments}` params.
    pub fn mcp_request(&self) -> JsonRpcRequest {
        JsonRpcRequest::call(
            self.correlation_id,
            "tools/call",
            serde_json::json!({ "name": self.tool, "arguments": self.arguments }),
        )
    }
}

/// Standard JSON-RPC error codes plus the tool server's own.
pub mod error_codes {
    /// JSON-RPC parse error.
    pub const PARSE_ERROR: i64 = -32700;
    /// Invalid JSON-RPC request.
    pub const INVALID_REQUEST: i64 = -32600;
    /// Method (tool) not found.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid params.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Requested record does not exist.
    pub const NOT_FOUND: i64 = -32004;
}
