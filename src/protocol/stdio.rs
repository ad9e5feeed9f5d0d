//! Tool server launched as a child process, spoken to over stdin/stdout.

use super::ToolTransport;
use super::client::ToolClient;
use super::error::{Result, ToolError};
use crate::config::ToolServerConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A spawned tool server plus the client attached to its pipes.
pub struct StdioTransport {
    client: ToolClient,
    child: Child,
}

impl StdioTransport {
    /// Start the configured tool server and connect to it.
    ///
    /// The process is killed if the transport is dropped without [`shutdown`](Self::shutdown).
    pub async fn spawn(config: &ToolServerConfig) -> Result<Self> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            ToolError::Unavailable(format!("failed to start '{}': {}", config.command, e))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Unavailable("tool server stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Unavailable("tool server stdout not captured".to_string()))?;

        tracing::info!(
            "Tool server started: {} {} (pid {:?})",
            config.command,
            config.args.join(" "),
            child.id()
        );

        let client = ToolClient::connect(stdout, stdin, config.client_options()).await?;
        Ok(Self { client, child })
    }

    /// Close the tool server's stdin and wait briefly for it to exit.
    pub async fn shutdown(self) {
        let Self { client, mut child } = self;
        drop(client);

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => tracing::debug!("Tool server exited: {}", status),
            Ok(Err(e)) => tracing::warn!("Tool server wait failed: {}", e),
            Err(_) => {
                tracing::warn!("Tool server did not exit within {:?}, killing", SHUTDOWN_GRACE);
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill tool server: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl ToolTransport for StdioTransport {
    async fn call(&self, tool: &str, arguments: Value) -> Result<Value> {
        self.client.call(tool, arguments).await
    }
}
