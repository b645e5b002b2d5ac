//! Response encoding with a fallback chain.
//!
//! 1. encode the intended result or error;
//! 2. on failure, encode a generic internal error for the same id;
//! 3. on failure of that too, give up and report the failure to the caller,
//!    which closes the connection rather than leave the request unanswered.

use serde::Serialize;

use crate::types::{
    error_codes, JsonRpcErrorObject, McpError, McpResult, RequestId, JSONRPC_VERSION,
};

#[derive(Serialize)]
struct SuccessFrame<'a, T: Serialize> {
    jsonrpc: &'static str,
    id: &'a RequestId,
    result: &'a T,
}

#[derive(Serialize)]
struct ErrorFrame<'a> {
    jsonrpc: &'static str,
    id: &'a RequestId,
    error: &'a JsonRpcErrorObject,
}

/// Encode a handler outcome as response bytes.
pub fn marshal_result<T: Serialize>(id: &RequestId, result: McpResult<T>) -> McpResult<Vec<u8>> {
    match result {
        Ok(value) => marshal_success(id, &value),
        Err(e) => marshal_error(id, &e.to_error_object()),
    }
}

pub fn marshal_success<T: Serialize>(id: &RequestId, result: &T) -> McpResult<Vec<u8>> {
    let frame = SuccessFrame {
        jsonrpc: JSONRPC_VERSION,
        id,
        result,
    };
    match serde_json::to_vec(&frame) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            tracing::warn!("Failed to encode result for request {id}: {e}");
            marshal_fallback(id)
        }
    }
}

pub fn marshal_error(id: &RequestId, error: &JsonRpcErrorObject) -> McpResult<Vec<u8>> {
    let frame = ErrorFrame {
        jsonrpc: JSONRPC_VERSION,
        id,
        error,
    };
    match serde_json::to_vec(&frame) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            tracing::warn!("Failed to encode error for request {id}: {e}");
            marshal_fallback(id)
        }
    }
}

fn marshal_fallback(id: &RequestId) -> McpResult<Vec<u8>> {
    let generic = JsonRpcErrorObject {
        code: error_codes::INTERNAL_ERROR,
        message: "Internal error: failed to encode response".to_string(),
        data: None,
    };
    let frame = ErrorFrame {
        jsonrpc: JSONRPC_VERSION,
        id,
        error: &generic,
    };
    serde_json::to_vec(&frame).map_err(|e| {
        tracing::error!("Cannot encode any response for request {id}: {e}");
        McpError::InternalError(format!("unable to answer request {id}: {e}"))
    })
}
