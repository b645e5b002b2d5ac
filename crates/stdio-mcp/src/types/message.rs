//! Outgoing JSON-RPC envelopes and request ids.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Value of the `jsonrpc` member on every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier: a string or an integer.
///
/// Numbers are normalized on decode, so an id written as `7` and read back
/// as `7.0` is still `RequestId::Number(7)`. Strings and numbers never
/// compare equal to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    /// Decode an id from a JSON value. Returns `None` for null, booleans,
    /// containers, fractional numbers, and integers outside the i64 range.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Some(RequestId::Number(i));
                }
                if n.is_u64() {
                    return None;
                }
                let f = n.as_f64()?;
                let bound = 2f64.powi(63);
                if f.is_finite() && f.fract() == 0.0 && f >= -bound && f < bound {
                    Some(RequestId::Number(f as i64))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Number(n) => Value::from(*n),
            RequestId::String(s) => Value::String(s.clone()),
        }
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RequestId::Number(n) => serializer.serialize_i64(*n),
            RequestId::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RequestId::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "request id must be a string or an integer, got {value}"
            ))
        })
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "\"{s}\""),
            RequestId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// Outgoing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Successful reply to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

/// Failed reply to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

/// The `error` member of a failed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Message without an id; never answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

impl JsonRpcError {
    pub fn new(id: RequestId, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code,
                message,
                data: None,
            },
        }
    }
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

impl std::fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_integer_and_float_compare_equal() {
        let sent = RequestId::from(42);
        let decoded: RequestId = serde_json::from_value(json!(42.0)).unwrap();
        assert_eq!(sent, decoded);
    }

    #[test]
    fn test_id_string_never_equals_number() {
        let a: RequestId = serde_json::from_value(json!("1")).unwrap();
        let b: RequestId = serde_json::from_value(json!(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_rejects_fractional_and_null() {
        assert!(RequestId::from_value(&json!(1.5)).is_none());
        assert!(RequestId::from_value(&Value::Null).is_none());
        assert!(RequestId::from_value(&json!(true)).is_none());
        assert!(RequestId::from_value(&json!(u64::MAX)).is_none());
        assert!(serde_json::from_value::<RequestId>(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_json() {
        assert_eq!(serde_json::to_string(&RequestId::from(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&RequestId::from("abc")).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_request_omits_missing_params() {
        let req = JsonRpcRequest::new(RequestId::from(1), "tools/list", None);
        let text = serde_json::to_string(&req).unwrap();
        assert_eq!(text, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
    }
}
