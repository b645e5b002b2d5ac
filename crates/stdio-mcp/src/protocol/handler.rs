//! Server dispatcher: drives the handshake and routes requests to handlers.

use std::sync::Arc;

use serde_json::value::RawValue;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::transport::writer::FrameSender;
use crate::types::methods::{self, INITIALIZE};
use crate::types::{
    CancelledParams, InitializeParams, InitializeResult, McpError, McpResult, RequestId,
};

use super::classifier::{Classified, IncomingNotification, IncomingRequest};
use super::marshal;
use super::negotiation::NegotiatedCapabilities;
use super::registry::HandlerRegistry;
use super::session::{Session, SessionState};

/// Channel on which spawned handler tasks report connection-fatal failures.
pub type FatalSender = mpsc::UnboundedSender<McpError>;

/// Dispatches classified messages for one server connection.
///
/// Owned by the read loop. Session state lives here and nowhere else.
pub struct ProtocolHandler {
    session: Session,
    capabilities: NegotiatedCapabilities,
    server: InitializeResult,
    registry: Arc<HandlerRegistry>,
    sender: FrameSender,
    fatal: FatalSender,
}

impl ProtocolHandler {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        server: InitializeResult,
        sender: FrameSender,
        fatal: FatalSender,
    ) -> Self {
        Self {
            session: Session::new(),
            capabilities: NegotiatedCapabilities::default(),
            server,
            registry,
            sender,
            fatal,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn capabilities(&self) -> &NegotiatedCapabilities {
        &self.capabilities
    }

    /// Handle one message. An `Err` means the connection must be closed.
    pub async fn dispatch(&mut self, message: Classified) -> McpResult<()> {
        match self.session.state() {
            SessionState::AwaitingInitialize => self.dispatch_awaiting_initialize(message).await,
            SessionState::AwaitingInitializedNotification => {
                self.dispatch_awaiting_initialized(message).await
            }
            SessionState::Ready => self.dispatch_ready(message).await,
        }
    }

    async fn dispatch_awaiting_initialize(&mut self, message: Classified) -> McpResult<()> {
        match message {
            Classified::Request(req) if req.method == INITIALIZE => {
                self.handle_initialize(req.id, req.params).await
            }
            other => {
                let reason = format!(
                    "expected '{INITIALIZE}' before any other message, got {}",
                    other.describe()
                );
                tracing::error!("Pre-handshake protocol violation: {reason}");
                let answerable = matches!(other, Classified::Request(_) | Classified::Malformed(_));
                if let (true, Some(id)) = (answerable, other.id()) {
                    let error = McpError::InvalidRequest(reason.clone());
                    match marshal::marshal_error(id, &error.to_error_object()) {
                        Ok(bytes) => {
                            if let Err(e) = self.sender.send_and_flush(bytes).await {
                                tracing::debug!("Could not report handshake violation: {e}");
                            }
                        }
                        Err(e) => tracing::debug!("Could not report handshake violation: {e}"),
                    }
                }
                Err(McpError::HandshakeViolation(reason))
            }
        }
    }

    async fn dispatch_awaiting_initialized(&mut self, message: Classified) -> McpResult<()> {
        match message {
            Classified::Notification(n) if methods::is_initialized_notification(&n.method) => {
                self.session.advance_to(SessionState::Ready)?;
                tracing::info!("MCP handshake complete");
                Ok(())
            }
            Classified::Notification(n) => {
                tracing::debug!(
                    "Ignoring notification '{}' while awaiting initialized",
                    n.method
                );
                Ok(())
            }
            Classified::Request(req) => {
                tracing::warn!(
                    "Request '{}' arrived before the initialized notification",
                    req.method
                );
                self.reply(
                    &req.id,
                    Err(McpError::InvalidRequest(format!(
                        "server is awaiting the initialized notification, '{}' not accepted yet",
                        req.method
                    ))),
                )
                .await
            }
            other => self.handle_stray(other).await,
        }
    }

    async fn dispatch_ready(&mut self, message: Classified) -> McpResult<()> {
        match message {
            Classified::Request(req) if req.method == INITIALIZE => {
                tracing::warn!("Duplicate initialize request (id {})", req.id);
                self.reply(
                    &req.id,
                    Err(McpError::InvalidRequest(
                        "session already initialized".to_string(),
                    )),
                )
                .await
            }
            Classified::Request(req) => self.route_request(req).await,
            Classified::Notification(n) => {
                self.handle_notification(n);
                Ok(())
            }
            other => self.handle_stray(other).await,
        }
    }

    async fn handle_initialize(
        &mut self,
        id: RequestId,
        params: Option<Box<RawValue>>,
    ) -> McpResult<()> {
        let result = params
            .map(|raw| serde_json::from_str::<InitializeParams>(raw.get()))
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))
            .and_then(|p| {
                p.ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))
            })
            .and_then(|p| self.capabilities.negotiate(p, &self.server));

        let accepted = result.is_ok();
        if let Err(e) = &result {
            tracing::warn!("Rejected initialize request: {e}");
        }

        let bytes = marshal::marshal_result(&id, result)?;
        // State advances only once the response is on the wire.
        self.sender.send_and_flush(bytes).await?;
        if accepted {
            self.session
                .advance_to(SessionState::AwaitingInitializedNotification)?;
        }
        Ok(())
    }

    async fn route_request(&mut self, req: IncomingRequest) -> McpResult<()> {
        let Some(handler) = self.registry.get(&req.method) else {
            tracing::debug!("No handler for method '{}'", req.method);
            return self
                .reply(&req.id, Err(McpError::MethodNotFound(req.method)))
                .await;
        };

        let sender = self.sender.clone();
        let fatal = self.fatal.clone();
        tokio::spawn(async move {
            let IncomingRequest { id, method, params } = req;
            tracing::debug!("Handling '{method}' (id {id})");

            // An inner task turns a panicking handler into an error response.
            let result = match tokio::spawn(async move { handler.handle(params).await }).await {
                Ok(result) => result,
                Err(e) => Err(McpError::InternalError(format!("handler failed: {e}"))),
            };
            if let Err(e) = &result {
                tracing::debug!("Handler for '{method}' returned error: {e}");
            }

            let outcome = match marshal::marshal_result(&id, result) {
                Ok(bytes) => sender.send(bytes).await,
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                tracing::error!("Could not answer '{method}' (id {id}): {e}");
                let _ = fatal.send(e);
            }
        });
        Ok(())
    }

    fn handle_notification(&self, notification: IncomingNotification) {
        match notification.method.as_str() {
            methods::NOTIFICATION_CANCELLED => {
                let parsed = notification
                    .params
                    .as_deref()
                    .map(|raw| serde_json::from_str::<CancelledParams>(raw.get()));
                match parsed {
                    Some(Ok(p)) => tracing::info!(
                        "Peer cancelled request {} ({}); in-flight work is not interrupted",
                        p.request_id,
                        p.reason.as_deref().unwrap_or("no reason")
                    ),
                    _ => tracing::info!("Received cancellation notification"),
                }
            }
            m if methods::is_initialized_notification(m) => {
                tracing::debug!("Ignoring repeated initialized notification");
            }
            other => tracing::debug!("Unhandled notification: {other}"),
        }
    }

    /// Responses, error responses, and malformed input outside the handshake.
    async fn handle_stray(&mut self, message: Classified) -> McpResult<()> {
        match message {
            Classified::Response(r) => {
                tracing::warn!("Dropping unsolicited response (id {})", r.id);
                Ok(())
            }
            Classified::Error(e) => {
                tracing::warn!("Dropping unsolicited error response (id {}): {}", e.id, e.error);
                Ok(())
            }
            Classified::Malformed(m) => match m.id {
                Some(id) => {
                    tracing::warn!("Malformed message (id {id}): {}", m.reason);
                    self.reply(&id, Err(McpError::InvalidRequest(m.reason))).await
                }
                None => {
                    tracing::warn!("Dropping malformed message: {}", m.reason);
                    Ok(())
                }
            },
            other => {
                tracing::debug!("Ignoring {}", other.describe());
                Ok(())
            }
        }
    }

    /// Queue a response built on the read task.
    async fn reply(&self, id: &RequestId, result: McpResult<Value>) -> McpResult<()> {
        let bytes = marshal::marshal_result(id, result)?;
        self.sender.send(bytes).await
    }
}
