//! MCP client: request/response correlation over one connection.

pub mod correlation;
pub mod process;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::protocol::classifier::{classify, Classified};
use crate::protocol::marshal;
use crate::transport::framing::{FrameError, FrameReader};
use crate::transport::writer::{spawn_writer, FrameSender, WriterTask};
use crate::types::methods;
use crate::types::{
    InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcRequest,
    McpError, McpResult, PromptGetParams, PromptGetResult, PromptListResult,
    ReadResourceResult, ResourceListResult, ResourceReadParams, ResourceTemplateListResult,
    ToolCallParams, ToolCallResult, ToolListResult,
};

pub use correlation::{CorrelationTable, IdAllocator, PendingCall};
pub use process::ServerProcess;

/// One client connection to an MCP server.
pub struct McpClient {
    sender: FrameSender,
    table: Arc<CorrelationTable>,
    ids: IdAllocator,
    config: ClientConfig,
    server: OnceLock<InitializeResult>,
    writer_task: WriterTask,
    reader_task: JoinHandle<McpResult<()>>,
}

impl McpClient {
    /// Start the connection's read and write tasks on `reader`/`writer`.
    pub fn connect<R, W>(reader: R, writer: W, config: ClientConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sender, writer_task) =
            spawn_writer(writer, config.framing, config.write_queue_capacity);
        let table = Arc::new(CorrelationTable::new());
        let frames = FrameReader::new(BufReader::new(reader), config.framing)
            .with_max_frame_bytes(config.max_frame_bytes);
        let reader_task = tokio::spawn(read_loop(frames, table.clone(), sender.clone()));

        Self {
            sender,
            table,
            ids: IdAllocator::new(),
            config,
            server: OnceLock::new(),
            writer_task,
            reader_task,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The server's `initialize` answer, once the handshake has run.
    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server.get()
    }

    /// Write a request and return a handle for its response.
    pub async fn send(&self, method: &str, params: Option<Value>) -> McpResult<PendingCall> {
        let id = self.ids.next_id();
        let rx = self.table.register(id.clone()).await?;
        let request = JsonRpcRequest::new(id.clone(), method, params);

        if let Err(e) = self.sender.send_message(&request).await {
            self.table.remove(&id).await;
            return Err(e);
        }
        tracing::debug!("Sent '{method}' (id {id})");
        Ok(PendingCall::new(id, method.to_string(), rx, self.table.clone()))
    }

    /// Write a notification. No response is expected.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.sender
            .send_message(&JsonRpcNotification::new(method, params))
            .await
    }

    /// Send a request and wait for its result using the configured timeout.
    pub async fn call(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        self.call_typed(method, params).await
    }

    /// Send a request and decode its result into `T`.
    pub async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> McpResult<T> {
        let pending = self.send(method, params).await?;
        let raw = pending.wait(self.config.request_timeout).await?;
        serde_json::from_str(raw.get()).map_err(|e| {
            McpError::MalformedReply(format!("unexpected '{method}' result shape: {e}"))
        })
    }

    /// Run the handshake: `initialize`, then `notifications/initialized`.
    pub async fn initialize(&self) -> McpResult<InitializeResult> {
        let params = InitializeParams::new(
            self.config.protocol_version.clone(),
            self.config.client_info.clone(),
        );
        let result: InitializeResult = self
            .call_typed(methods::INITIALIZE, Some(to_params(&params)?))
            .await?;

        if result.protocol_version != self.config.protocol_version {
            tracing::warn!(
                "Server answered with protocol version {}, client asked for {}",
                result.protocol_version,
                self.config.protocol_version
            );
        }
        tracing::info!("Connected to {}", result.server_info);

        self.notify(methods::NOTIFICATION_INITIALIZED, None).await?;
        let _ = self.server.set(result.clone());
        Ok(result)
    }

    pub async fn ping(&self) -> McpResult<()> {
        let _: Value = self.call(methods::PING, None).await?;
        Ok(())
    }

    pub async fn list_tools(&self) -> McpResult<ToolListResult> {
        self.call_typed(methods::TOOLS_LIST, None).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> McpResult<ToolCallResult> {
        let params = ToolCallParams {
            name: name.to_string(),
            arguments,
        };
        self.call_typed(methods::TOOLS_CALL, Some(to_params(&params)?))
            .await
    }

    pub async fn list_prompts(&self) -> McpResult<PromptListResult> {
        self.call_typed(methods::PROMPTS_LIST, None).await
    }

    pub async fn get_prompt(&self, name: &str, arguments: Option<Value>) -> McpResult<PromptGetResult> {
        let params = PromptGetParams {
            name: name.to_string(),
            arguments,
        };
        self.call_typed(methods::PROMPTS_GET, Some(to_params(&params)?))
            .await
    }

    pub async fn list_resources(&self) -> McpResult<ResourceListResult> {
        self.call_typed(methods::RESOURCES_LIST, None).await
    }

    pub async fn list_resource_templates(&self) -> McpResult<ResourceTemplateListResult> {
        self.call_typed(methods::RESOURCES_TEMPLATES_LIST, None).await
    }

    pub async fn read_resource(&self, uri: &str) -> McpResult<ReadResourceResult> {
        let params = ResourceReadParams {
            uri: uri.to_string(),
        };
        self.call_typed(methods::RESOURCES_READ, Some(to_params(&params)?))
            .await
    }

    /// Close the write side and wait for queued frames to drain.
    ///
    /// The read task keeps running until the server closes its side.
    pub async fn close(self) -> McpResult<()> {
        let McpClient {
            sender,
            writer_task,
            reader_task,
            ..
        } = self;
        sender.close().await?;
        drop(sender);
        writer_task.finish().await?;
        drop(reader_task);
        tracing::debug!("Client write side closed");
        Ok(())
    }

    /// Close the write side, then wait up to `grace` for the server to
    /// close its side.
    pub async fn shutdown(self, grace: Duration) -> McpResult<()> {
        let McpClient {
            sender,
            writer_task,
            reader_task,
            ..
        } = self;
        sender.close().await?;
        writer_task.finish().await?;
        match tokio::time::timeout(grace, reader_task).await {
            Ok(joined) => {
                joined.map_err(|e| McpError::InternalError(format!("reader task failed: {e}")))?
            }
            Err(_) => {
                tracing::warn!("Server did not close its output within {grace:?}");
                Ok(())
            }
        }
    }
}

fn to_params<T: Serialize>(params: &T) -> McpResult<Value> {
    serde_json::to_value(params).map_err(|e| McpError::InternalError(e.to_string()))
}

/// Route every incoming frame until the server closes its output.
async fn read_loop<R>(
    mut frames: FrameReader<R>,
    table: Arc<CorrelationTable>,
    sender: FrameSender,
) -> McpResult<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let outcome = loop {
        let payload = match frames.read_frame().await {
            Ok(payload) => payload,
            Err(FrameError::EndOfStream) => {
                tracing::debug!("Server closed its output");
                break Ok(());
            }
            Err(e) => {
                tracing::error!("Unrecoverable framing error from server: {e}");
                break Err(e.into());
            }
        };

        match classify(&payload) {
            Classified::Response(r) => {
                if !table.complete(&r.id, Ok(r.result)).await {
                    tracing::warn!("Dropping response for unknown request id {}", r.id);
                }
            }
            Classified::Error(e) => {
                let id = e.id.clone();
                if !table.complete(&id, Err(McpError::Rpc(e.error))).await {
                    tracing::warn!("Dropping error response for unknown request id {id}");
                }
            }
            Classified::Request(req) => {
                tracing::warn!(
                    "Server-initiated request '{}' is not supported; answering MethodNotFound",
                    req.method
                );
                let error = McpError::MethodNotFound(req.method);
                match marshal::marshal_error(&req.id, &error.to_error_object()) {
                    Ok(bytes) => {
                        if let Err(e) = sender.send(bytes).await {
                            tracing::debug!("Could not answer server request: {e}");
                        }
                    }
                    Err(e) => tracing::error!("Could not encode answer to server request: {e}"),
                }
            }
            Classified::Notification(n) => {
                tracing::debug!("Server notification: {}", n.method);
            }
            Classified::Malformed(m) => match m.id {
                Some(id) => {
                    tracing::warn!("Malformed reply for request {id}: {}", m.reason);
                    if !table.complete(&id, Err(McpError::MalformedReply(m.reason))).await {
                        tracing::warn!("Dropping malformed reply for unknown request id {id}");
                    }
                }
                None => {
                    tracing::warn!("Dropping malformed message from server: {}", m.reason);
                }
            },
        }
    };

    table.close().await;
    outcome
}
