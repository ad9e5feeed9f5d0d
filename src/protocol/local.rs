//! In-process tool table.
//!
//! Same contract as a remote tool server, minus the byte stream. Useful for
//! embedding the router next to an existing data layer and for tests.

use super::ToolTransport;
use super::error::{Result, ToolError};
use super::types::error_codes;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type Handler = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

#[derive(Clone, Default)]
pub struct LocalTools {
    handlers: HashMap<String, Handler>,
    calls: Arc<AtomicU64>,
}

impl LocalTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a tool handler.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_tool<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, handler);
        self
    }

    /// Number of calls served so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolTransport for LocalTools {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value> {
        let id = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Local tools: #{} {}", id, tool);
        match self.handlers.get(tool) {
            Some(handler) => handler(arguments),
            None => Err(ToolError::Rpc {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {}", tool),
            }),
        }
    }
}
