//! Waiter table matching responses to outstanding requests by id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::value::RawValue;
use tokio::sync::{oneshot, Mutex};

use crate::types::{McpError, McpResult, RequestId};

/// Outcome delivered to a waiter: the raw `result` or the failure.
pub type CallOutcome = McpResult<Box<RawValue>>;

/// Allocates request ids. Strictly increasing, starting at 1, never reused.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicI64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    pub fn next_id(&self) -> RequestId {
        RequestId::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct TableState {
    waiters: HashMap<RequestId, oneshot::Sender<CallOutcome>>,
    closed: bool,
}

/// Pending calls keyed by id.
#[derive(Default)]
pub struct CorrelationTable {
    state: Mutex<TableState>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a waiter for `id`. Fails once the connection has ended or when
    /// `id` is already in flight.
    pub async fn register(&self, id: RequestId) -> McpResult<oneshot::Receiver<CallOutcome>> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(McpError::ConnectionClosed);
        }
        if state.waiters.contains_key(&id) {
            return Err(McpError::InvalidRequest(format!(
                "request id {id} is already in flight"
            )));
        }
        let (tx, rx) = oneshot::channel();
        state.waiters.insert(id, tx);
        Ok(rx)
    }

    /// Deliver an outcome. Returns false when nobody was waiting on `id`.
    pub async fn complete(&self, id: &RequestId, outcome: CallOutcome) -> bool {
        let waiter = self.state.lock().await.waiters.remove(id);
        match waiter {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    tracing::debug!("Waiter for request {id} went away before its response");
                }
                true
            }
            None => false,
        }
    }

    /// Forget a waiter, e.g. after it timed out.
    pub async fn remove(&self, id: &RequestId) -> bool {
        self.state.lock().await.waiters.remove(id).is_some()
    }

    /// Fail every waiter and refuse new ones.
    pub async fn close(&self) {
        let waiters = {
            let mut state = self.state.lock().await;
            state.closed = true;
            std::mem::take(&mut state.waiters)
        };
        if !waiters.is_empty() {
            tracing::debug!("Failing {} pending call(s): connection closed", waiters.len());
        }
        for (_, tx) in waiters {
            let _ = tx.send(Err(McpError::ConnectionClosed));
        }
    }

    pub async fn pending(&self) -> usize {
        self.state.lock().await.waiters.len()
    }
}

/// A request that has been written and is awaiting its response.
pub struct PendingCall {
    id: RequestId,
    method: String,
    rx: oneshot::Receiver<CallOutcome>,
    table: std::sync::Arc<CorrelationTable>,
}

impl PendingCall {
    pub(crate) fn new(
        id: RequestId,
        method: String,
        rx: oneshot::Receiver<CallOutcome>,
        table: std::sync::Arc<CorrelationTable>,
    ) -> Self {
        Self {
            id,
            method,
            rx,
            table,
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Wait for the response, end of stream, or `timeout`.
    pub async fn wait(self, timeout: Option<Duration>) -> CallOutcome {
        let PendingCall {
            id,
            method,
            rx,
            table,
        } = self;

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    table.remove(&id).await;
                    tracing::warn!("Request '{method}' (id {id}) timed out after {limit:?}");
                    return Err(McpError::Timeout(limit));
                }
            },
            None => rx.await,
        };

        received.map_err(|_| McpError::ConnectionClosed)?
    }
}
