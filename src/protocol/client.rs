//! JSON-RPC tool client over a line-delimited byte stream.
//!
//! One client owns one connection for the lifetime of a run:
//!
//! ```text
//! call() ──► outbound mpsc ──► writer task ──► stream
//!   ▲                                            │
//!   └── oneshot ◄── pending[id] ◄── reader task ◄┘
//! ```
//!
//! Calls take a per-connection turn, so at most one request is in flight.
//! Replies are still routed purely by id, so stale replies to timed-out
//! calls are recognised and dropped.

use super::error::{Result, ToolError};
use super::types::{JsonRpcRequest, JsonRpcResponse, ToolCall, error_codes};
use super::{ToolTransport, tools};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

const OUTBOUND_QUEUE: usize = 32;

const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// How tool calls are framed on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireDialect {
    /// `{"method": "<tool>", "params": {..}, "id": n}`
    Direct,
    /// MCP: `initialize` handshake, then `tools/call {name, arguments}`.
    #[default]
    Mcp,
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub dialect: WireDialect,
    /// Bound on one exchange: queueing the request plus waiting for its reply.
    pub timeout: Duration,
    /// Total attempts for read-only tools (1 = no retry).
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dialect: WireDialect::default(),
            timeout: Duration::from_secs(10),
            retry_attempts: 1,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// Long-lived connection to a tool-serving process.
pub struct ToolClient {
    outbound: mpsc::Sender<String>,
    pending: PendingMap,
    next_id: AtomicU64,
    turn: Mutex<()>,
    closed: CancellationToken,
    options: ClientOptions,
}

impl ToolClient {
    /// Attach to an already-open stream and, for MCP, run the handshake.
    pub async fn connect<R, W>(reader: R, writer: W, options: ClientOptions) -> Result<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = CancellationToken::new();
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);

        tokio::spawn(write_loop(
            FramedWrite::new(writer, LinesCodec::new()),
            outbound_rx,
            closed.clone(),
        ));
        tokio::spawn(read_loop(
            FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES)),
            pending.clone(),
            closed.clone(),
        ));

        let client = Self {
            outbound,
            pending,
            next_id: AtomicU64::new(1),
            turn: Mutex::new(()),
            closed,
            options,
        };

        if client.options.dialect == WireDialect::Mcp {
            client.initialize().await?;
        }

        Ok(client)
    }

    /// Whether the connection has been lost.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn initialize(&self) -> Result<()> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        });
        let request = JsonRpcRequest::call(self.next_id(), "initialize", params);
        let response = self.round_trip(request, "initialize").await?;
        if let Some(err) = response.error {
            return Err(ToolError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let server = response
            .result
            .as_ref()
            .and_then(|r| r.pointer("/serverInfo/name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::info!("Tool client: MCP session initialized with '{}'", server);

        let note = JsonRpcRequest::notification("notifications/initialized", Value::Null);
        match tokio::time::timeout(self.options.timeout, self.send_line(&note)).await {
            Ok(sent) => sent,
            Err(_) => Err(ToolError::Timeout {
                tool: "notifications/initialized".to_string(),
                after: self.options.timeout,
            }),
        }
    }

    async fn send_line(&self, request: &JsonRpcRequest) -> Result<()> {
        let line =
            serde_json::to_string(request).map_err(|e| ToolError::Protocol(e.to_string()))?;
        self.outbound
            .send(line)
            .await
            .map_err(|_| ToolError::Unavailable("connection writer stopped".to_string()))
    }

    /// Send one request and wait for the reply with the same id.
    ///
    /// A single deadline covers both the enqueue and the reply: a tool
    /// server that stops reading its stdin backs up the writer, and that
    /// must time out like a silent one.
    async fn round_trip(&self, request: JsonRpcRequest, label: &str) -> Result<JsonRpcResponse> {
        let Some(id) = request.id else {
            return Err(ToolError::Protocol(format!("{} has no correlation id", label)));
        };
        if self.is_closed() {
            return Err(ToolError::Unavailable("connection closed".to_string()));
        }

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        // The reader cancels before it clears the pending map, so a call
        // registered after the clear always sees the cancellation here.
        if self.is_closed() {
            self.pending.lock().await.remove(&id);
            return Err(ToolError::Unavailable("connection closed".to_string()));
        }

        tracing::debug!("Tool client: -> #{} {} ({})", id, request.method, label);
        let exchange = async {
            self.send_line(&request).await?;
            rx.await.map_err(|_| {
                ToolError::Unavailable(format!("connection closed before reply to {}", label))
            })
        };

        match tokio::time::timeout(self.options.timeout, exchange).await {
            Ok(Ok(response)) => {
                tracing::debug!("Tool client: <- #{}", id);
                Ok(response)
            }
            Ok(Err(e)) => {
                self.pending.lock().await.remove(&id);
                Err(e)
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                tracing::warn!(
                    "Tool client: #{} {} timed out after {:?}",
                    id,
                    label,
                    self.options.timeout
                );
                Err(ToolError::Timeout {
                    tool: label.to_string(),
                    after: self.options.timeout,
                })
            }
        }
    }

    async fn call_once(&self, tool: &str, arguments: Value) -> Result<Value> {
        let call = ToolCall::new(self.next_id(), tool, arguments);
        match self.options.dialect {
            WireDialect::Direct => {
                let response = self.round_trip(call.direct_request(), &call.tool).await?;
                decode_direct(response)
            }
            WireDialect::Mcp => {
                let response = self.round_trip(call.mcp_request(), &call.tool).await?;
                decode_mcp(response)
            }
        }
    }
}

#[async_trait]
impl ToolTransport for ToolClient {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value> {
        let _turn = self.turn.lock().await;

        let attempts = if tools::is_read_only(tool) {
            self.options.retry_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            match self.call_once(tool, arguments.clone()).await {
                Err(e) if e.is_unavailable() && attempt < attempts && !self.is_closed() => {
                    tracing::warn!(
                        "Tool client: {} attempt {}/{} failed: {}",
                        tool,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.options.retry_backoff * attempt).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl Drop for ToolClient {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

fn decode_direct(response: JsonRpcResponse) -> Result<Value> {
    if let Some(err) = response.error {
        return Err(ToolError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

/// Unwrap an MCP `CallToolResult`: the first text item holds the JSON payload.
fn decode_mcp(response: JsonRpcResponse) -> Result<Value> {
    if let Some(err) = response.error {
        return Err(ToolError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    let result = response.result.unwrap_or(Value::Null);
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .find_map(|item| item.get("text").and_then(Value::as_str))
        });

    if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::Rpc {
            code: error_codes::INTERNAL_ERROR,
            message: text.unwrap_or("tool reported an error").to_string(),
        });
    }

    match text {
        Some(text) => {
            Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
        }
        None => Ok(result.get("structuredContent").cloned().unwrap_or(Value::Null)),
    }
}

async fn write_loop<W>(
    mut sink: FramedWrite<W, LinesCodec>,
    mut outbound: mpsc::Receiver<String>,
    closed: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            line = outbound.recv() => {
                let Some(line) = line else { break };
                if let Err(e) = sink.send(line).await {
                    tracing::error!("Tool client: write failed: {}", e);
                    closed.cancel();
                    break;
                }
            }
        }
    }
}

async fn read_loop<R>(
    mut lines: FramedRead<R, LinesCodec>,
    pending: PendingMap,
    closed: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let next = tokio::select! {
            _ = closed.cancelled() => break,
            next = lines.next() => next,
        };
        match next {
            Some(Ok(line)) => route_line(&line, &pending).await,
            Some(Err(e)) => {
                tracing::error!("Tool client: read failed: {}", e);
                break;
            }
            None => {
                tracing::warn!("Tool client: tool server closed the stream");
                break;
            }
        }
    }

    closed.cancel();
    // Dropping the senders wakes every waiting call with a closed-channel error.
    pending.lock().await.clear();
}

async fn route_line(line: &str, pending: &PendingMap) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Tool client: ignoring undecodable line: {}", e);
            return;
        }
    };
    if raw.get("method").is_some() {
        tracing::debug!("Tool client: ignoring server-initiated message");
        return;
    }

    let response: JsonRpcResponse = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Tool client: ignoring malformed response: {}", e);
            return;
        }
    };
    let Some(id) = response.correlation_id() else {
        tracing::debug!("Tool client: ignoring response without a usable id");
        return;
    };

    match pending.lock().await.remove(&id) {
        Some(tx) => {
            let _ = tx.send(response);
        }
        None => tracing::debug!("Tool client: dropping reply for unknown id {}", id),
    }
}
