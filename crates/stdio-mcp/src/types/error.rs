//! Error types and JSON-RPC error codes for the MCP engine.

use std::time::Duration;

use mcp_content::ContentError;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Codes reserved by JSON-RPC itself.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Server-defined codes for lookups that miss.
pub mod mcp_error_codes {
    pub const RESOURCE_NOT_FOUND: i32 = -32802;
    pub const TOOL_NOT_FOUND: i32 = -32803;
    pub const PROMPT_NOT_FOUND: i32 = -32804;
}

/// All errors that can occur on either side of a connection.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// Error response received from the peer.
    #[error("Peer returned error: {0}")]
    Rpc(JsonRpcErrorObject),

    /// Reply from the peer that is not a usable response to our request.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    #[error("Framing error: {0}")]
    Framing(String),

    #[error("End of stream")]
    EndOfStream,

    #[error("Handshake violation: {0}")]
    HandshakeViolation(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) | McpError::HandshakeViolation(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::PromptNotFound(_) => PROMPT_NOT_FOUND,
            McpError::Rpc(err) => err.code,
            McpError::Json(_) => PARSE_ERROR,
            McpError::InternalError(_)
            | McpError::MalformedReply(_)
            | McpError::Framing(_)
            | McpError::EndOfStream
            | McpError::ConnectionClosed
            | McpError::Timeout(_)
            | McpError::Config(_)
            | McpError::Transport(_)
            | McpError::Io(_) => INTERNAL_ERROR,
        }
    }

    /// The error object sent on the wire for this error.
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            McpError::Rpc(err) => err.clone(),
            other => JsonRpcErrorObject {
                code: other.code(),
                message: other.to_string(),
                data: None,
            },
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: self.to_error_object(),
        }
    }

    /// Whether the connection can no longer carry traffic after this error.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            McpError::EndOfStream
                | McpError::ConnectionClosed
                | McpError::Framing(_)
                | McpError::Transport(_)
                | McpError::Io(_)
        )
    }
}

impl From<ContentError> for McpError {
    fn from(e: ContentError) -> Self {
        if e.is_invalid_input() {
            McpError::InvalidParams(e.to_string())
        } else if e.is_not_found() {
            McpError::ResourceNotFound(e.to_string())
        } else if matches!(e, ContentError::PermissionDenied(_) | ContentError::TooLarge { .. }) {
            McpError::InvalidParams(e.to_string())
        } else {
            McpError::InternalError(e.to_string())
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_json_rpc() {
        assert_eq!(McpError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(McpError::InvalidParams("x".into()).code(), -32602);
        assert_eq!(McpError::InvalidRequest("x".into()).code(), -32600);
        assert_eq!(McpError::InternalError("x".into()).code(), -32603);
    }

    #[test]
    fn test_peer_error_round_trips_unchanged() {
        let obj = JsonRpcErrorObject {
            code: -32000,
            message: "custom".into(),
            data: Some(serde_json::json!({"detail": 1})),
        };
        let err = McpError::Rpc(obj.clone());
        assert_eq!(err.code(), -32000);
        assert_eq!(err.to_error_object(), obj);
    }

    #[test]
    fn test_content_errors_map_to_protocol_codes() {
        let invalid: McpError = ContentError::LengthNotPositive.into();
        assert_eq!(invalid.code(), error_codes::INVALID_PARAMS);

        let missing: McpError = ContentError::NotFound("/nope".into()).into();
        assert_eq!(missing.code(), mcp_error_codes::RESOURCE_NOT_FOUND);
    }
}
