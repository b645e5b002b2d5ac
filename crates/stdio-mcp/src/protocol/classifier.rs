//! Envelope-level classification of incoming JSON-RPC payloads.
//!
//! Only the envelope fields are decoded here. `params` and `result` stay as
//! raw JSON until the method (or the pending call) tells us the target type.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::types::{JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Shape of a classified message, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Notification,
    SuccessResponse,
    ErrorResponse,
    Malformed,
}

#[derive(Debug)]
pub struct IncomingRequest {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Box<RawValue>>,
}

#[derive(Debug)]
pub struct IncomingNotification {
    pub method: String,
    pub params: Option<Box<RawValue>>,
}

#[derive(Debug)]
pub struct IncomingResponse {
    pub id: RequestId,
    pub result: Box<RawValue>,
}

#[derive(Debug)]
pub struct IncomingError {
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

/// A payload that is not any recognised JSON-RPC 2.0 shape.
#[derive(Debug)]
pub struct Malformed {
    /// Recovered when the envelope carried a usable id.
    pub id: Option<RequestId>,
    pub reason: String,
}

/// A decoded envelope.
#[derive(Debug)]
pub enum Classified {
    Request(IncomingRequest),
    Notification(IncomingNotification),
    Response(IncomingResponse),
    Error(IncomingError),
    Malformed(Malformed),
}

impl Classified {
    pub fn kind(&self) -> MessageKind {
        match self {
            Classified::Request(_) => MessageKind::Request,
            Classified::Notification(_) => MessageKind::Notification,
            Classified::Response(_) => MessageKind::SuccessResponse,
            Classified::Error(_) => MessageKind::ErrorResponse,
            Classified::Malformed(_) => MessageKind::Malformed,
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            Classified::Request(r) => Some(&r.method),
            Classified::Notification(n) => Some(&n.method),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Classified::Request(r) => Some(&r.id),
            Classified::Response(r) => Some(&r.id),
            Classified::Error(e) => Some(&e.id),
            Classified::Malformed(m) => m.id.as_ref(),
            Classified::Notification(_) => None,
        }
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Classified::Request(r) => format!("request '{}' (id {})", r.method, r.id),
            Classified::Notification(n) => format!("notification '{}'", n.method),
            Classified::Response(r) => format!("response (id {})", r.id),
            Classified::Error(e) => format!("error response (id {})", e.id),
            Classified::Malformed(m) => format!("malformed message ({})", m.reason),
        }
    }
}

/// Envelope with every member kept raw so one bad field cannot hide the id.
/// JSON `null` decodes as absent, except for `result` where null is a value.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    jsonrpc: Option<Box<RawValue>>,
    #[serde(default)]
    id: Option<Box<RawValue>>,
    #[serde(default)]
    method: Option<Box<RawValue>>,
    #[serde(default)]
    params: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "present")]
    result: Option<Box<RawValue>>,
    #[serde(default)]
    error: Option<Box<RawValue>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

fn malformed(id: Option<RequestId>, reason: impl Into<String>) -> Classified {
    Classified::Malformed(Malformed {
        id,
        reason: reason.into(),
    })
}

/// Classify one frame payload. Total: every input maps to exactly one variant.
pub fn classify(payload: &[u8]) -> Classified {
    if payload.iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'{') {
        return malformed(None, "payload is not a JSON object");
    }
    let envelope: Envelope = match serde_json::from_slice(payload) {
        Ok(envelope) => envelope,
        Err(e) => return malformed(None, format!("not a JSON-RPC object: {e}")),
    };

    // The id is recovered first so malformed requests can still be answered.
    let (id, id_error) = match envelope.id.as_deref() {
        None => (None, None),
        Some(raw) => match serde_json::from_str::<Value>(raw.get())
            .ok()
            .as_ref()
            .and_then(RequestId::from_value)
        {
            Some(id) => (Some(id), None),
            None => (None, Some(format!("invalid id {}", raw.get()))),
        },
    };

    let version = envelope
        .jsonrpc
        .as_deref()
        .and_then(|raw| serde_json::from_str::<String>(raw.get()).ok());
    if version.as_deref() != Some(JSONRPC_VERSION) {
        return malformed(id, "jsonrpc must be \"2.0\"");
    }
    if let Some(reason) = id_error {
        return malformed(None, reason);
    }

    let method = match envelope.method.as_deref() {
        None => None,
        Some(raw) => match serde_json::from_str::<String>(raw.get()) {
            Ok(m) if !m.is_empty() => Some(m),
            Ok(_) => return malformed(id, "method must not be empty"),
            Err(_) => return malformed(id, "method must be a string"),
        },
    };

    let has_result = envelope.result.is_some();
    let has_error = envelope.error.is_some();

    match (id, method) {
        (Some(id), Some(method)) if !has_result && !has_error => {
            Classified::Request(IncomingRequest {
                id,
                method,
                params: envelope.params,
            })
        }
        (None, Some(method)) => Classified::Notification(IncomingNotification {
            method,
            params: envelope.params,
        }),
        (Some(id), _) if has_result != has_error => match envelope.result {
            Some(result) => Classified::Response(IncomingResponse { id, result }),
            None => {
                let raw = envelope.error.as_deref().map(RawValue::get).unwrap_or("null");
                match serde_json::from_str::<JsonRpcErrorObject>(raw) {
                    Ok(error) => Classified::Error(IncomingError { id, error }),
                    Err(e) => malformed(Some(id), format!("invalid error object: {e}")),
                }
            }
        },
        (id, _) => malformed(id, "no recognised JSON-RPC shape"),
    }
}
