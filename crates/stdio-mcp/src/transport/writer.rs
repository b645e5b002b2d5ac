//! Single-consumer frame writer.
//!
//! Every outbound frame goes through one bounded queue drained by one task,
//! so a frame is always written whole and two frames never interleave.

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::types::{McpError, McpResult};

use super::framing::Framing;

pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 64;

enum WriteJob {
    Frame {
        bytes: Vec<u8>,
        written: Option<oneshot::Sender<McpResult<()>>>,
    },
    Close,
}

/// Cloneable handle for queueing outbound payloads.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<WriteJob>,
    framing: Framing,
}

impl FrameSender {
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Queue a payload. Waits only for queue space, not for the write.
    pub async fn send(&self, payload: Vec<u8>) -> McpResult<()> {
        let bytes = self.framing.encode(&payload);
        self.tx
            .send(WriteJob::Frame {
                bytes,
                written: None,
            })
            .await
            .map_err(|_| McpError::ConnectionClosed)
    }

    /// Queue a payload and wait until it has been written and flushed.
    pub async fn send_and_flush(&self, payload: Vec<u8>) -> McpResult<()> {
        let bytes = self.framing.encode(&payload);
        let (written_tx, written_rx) = oneshot::channel();
        self.tx
            .send(WriteJob::Frame {
                bytes,
                written: Some(written_tx),
            })
            .await
            .map_err(|_| McpError::ConnectionClosed)?;
        written_rx.await.map_err(|_| McpError::ConnectionClosed)?
    }

    /// Serialize and queue a message.
    pub async fn send_message<T: Serialize>(&self, message: &T) -> McpResult<()> {
        let payload = serde_json::to_vec(message)?;
        self.send(payload).await
    }

    /// Ask the writer to shut down the stream once everything queued
    /// before this call has been written. Later sends fail.
    pub async fn close(&self) -> McpResult<()> {
        self.tx
            .send(WriteJob::Close)
            .await
            .map_err(|_| McpError::ConnectionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Handle on the running writer task.
pub struct WriterTask {
    handle: JoinHandle<McpResult<()>>,
}

impl WriterTask {
    /// Wait for the writer to drain and exit.
    ///
    /// Returns once every `FrameSender` is dropped or `close` was called.
    pub async fn finish(self) -> McpResult<()> {
        self.handle
            .await
            .map_err(|e| McpError::InternalError(format!("writer task failed: {e}")))?
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Spawn the writer task that owns `writer`.
pub fn spawn_writer<W>(writer: W, framing: Framing, capacity: usize) -> (FrameSender, WriterTask)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(write_loop(writer, rx));
    (FrameSender { tx, framing }, WriterTask { handle })
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<WriteJob>) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(job) = rx.recv().await {
        match job {
            WriteJob::Frame { bytes, written } => {
                let result = write_frame(&mut writer, &bytes).await;
                match result {
                    Ok(()) => {
                        if let Some(tx) = written {
                            let _ = tx.send(Ok(()));
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to write frame: {e}");
                        if let Some(tx) = written {
                            let _ = tx.send(Err(McpError::Transport(e.to_string())));
                        }
                        return Err(McpError::Io(e));
                    }
                }
            }
            WriteJob::Close => {
                tracing::debug!("Writer closing output stream");
                break;
            }
        }
    }

    writer.shutdown().await?;
    Ok(())
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}
