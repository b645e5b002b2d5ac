//! Server transport loop over stdin/stdout or any byte-stream pair.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::protocol::classifier::classify;
use crate::protocol::{HandlerRegistry, ProtocolHandler};
use crate::types::{McpError, McpResult};

use super::framing::{FrameError, FrameReader};
use super::writer::spawn_writer;

/// Stdio transport for an MCP server running as a child process.
pub struct StdioTransport {
    registry: Arc<HandlerRegistry>,
    config: ServerConfig,
}

impl StdioTransport {
    pub fn new(registry: HandlerRegistry, config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve one session on the process's stdin and stdout.
    pub async fn run(&self) -> McpResult<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one session on `reader`/`writer`.
    ///
    /// Returns `Ok` when the peer closes its side, after every in-flight
    /// handler has answered and the output is drained. Returns `Err` on a
    /// framing error, a handshake violation, or a write failure.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let framing = self.config.framing;
        let (sender, writer_task) =
            spawn_writer(writer, framing, self.config.write_queue_capacity);
        let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<McpError>();

        let mut handler = ProtocolHandler::new(
            self.registry.clone(),
            self.config.initialize_result(),
            sender,
            fatal_tx,
        );
        let mut frames = FrameReader::new(BufReader::new(reader), framing)
            .with_max_frame_bytes(self.config.max_frame_bytes);

        tracing::info!(
            "Stdio transport started ({framing} framing, {} methods)",
            self.registry.len()
        );

        let outcome = loop {
            let frame = tokio::select! {
                biased;
                Some(err) = fatal_rx.recv() => break Err(err),
                frame = frames.read_frame() => frame,
            };

            match frame {
                Ok(payload) => {
                    let message = classify(&payload);
                    tracing::trace!("Received {}", message.describe());
                    if let Err(e) = handler.dispatch(message).await {
                        break Err(e);
                    }
                }
                Err(FrameError::EndOfStream) => {
                    tracing::info!("EOF on input, shutting down");
                    break Ok(());
                }
                Err(e) => {
                    tracing::error!("Unrecoverable framing error: {e}");
                    break Err(e.into());
                }
            }
        };

        tracing::debug!("Read loop exited in state {}", handler.state());
        drop(handler);

        match outcome {
            Ok(()) => {
                // Each in-flight handler holds a sender; the writer exits
                // once the last of them has queued its response.
                writer_task.finish().await
            }
            Err(e) => {
                tracing::error!("Closing connection: {e}");
                writer_task.abort();
                Err(e)
            }
        }
    }
}
