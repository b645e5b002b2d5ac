//! Per-connection handshake state.

use std::fmt;

use crate::types::{McpError, McpResult};

/// Handshake progress of one connection. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    AwaitingInitialize,
    AwaitingInitializedNotification,
    Ready,
}

impl SessionState {
    /// The single state this one may advance to.
    pub fn next(self) -> Option<SessionState> {
        match self {
            SessionState::AwaitingInitialize => Some(SessionState::AwaitingInitializedNotification),
            SessionState::AwaitingInitializedNotification => Some(SessionState::Ready),
            SessionState::Ready => None,
        }
    }

    pub fn is_ready(self) -> bool {
        self == SessionState::Ready
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::AwaitingInitialize => "awaiting-initialize",
            SessionState::AwaitingInitializedNotification => "awaiting-initialized",
            SessionState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Owner of the connection's state value.
///
/// Held by the dispatcher alone; handlers never see it.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::AwaitingInitialize,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Step to `target`, which must be the immediate successor.
    pub fn advance_to(&mut self, target: SessionState) -> McpResult<()> {
        if self.state.next() != Some(target) {
            return Err(McpError::InternalError(format!(
                "illegal session transition {} -> {target}",
                self.state
            )));
        }
        tracing::debug!("Session state {} -> {target}", self.state);
        self.state = target;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
