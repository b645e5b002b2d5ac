//! Spawning an MCP server as a child process and talking to it over its pipes.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::config::ClientConfig;
use crate::types::{McpError, McpResult};

use super::McpClient;

/// How long a server gets to exit after its stdin is closed.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// A running server child plus the client connected to it.
pub struct ServerProcess {
    child: Child,
    client: McpClient,
}

impl ServerProcess {
    /// Spawn `program` with `args`, wiring its stdin/stdout to a client.
    /// The child's stderr is inherited so its logs stay visible.
    pub fn spawn(program: &str, args: &[String], config: ClientConfig) -> McpResult<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::Transport(format!("failed to spawn '{program}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Transport("child stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Transport("child stdout was not captured".to_string()))?;

        tracing::info!(
            "Spawned server '{program}' (pid {})",
            child.id().map_or_else(|| "unknown".to_string(), |id| id.to_string())
        );

        Ok(Self {
            child,
            client: McpClient::connect(stdout, stdin, config),
        })
    }

    pub fn client(&self) -> &McpClient {
        &self.client
    }

    /// Close the server's stdin, then wait up to `grace` for it to exit,
    /// killing it if it does not.
    pub async fn shutdown(self, grace: Duration) -> McpResult<Option<ExitStatus>> {
        let ServerProcess { mut child, client } = self;

        if let Err(e) = client.close().await {
            tracing::warn!("Error closing server stdin: {e}");
        }

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(status) => {
                let status = status?;
                tracing::info!("Server exited with {status}");
                Ok(Some(status))
            }
            Err(_) => {
                tracing::warn!("Server did not exit within {grace:?}, killing it");
                child.kill().await?;
                Ok(None)
            }
        }
    }
}
