//! JSON-RPC 2.0 envelope

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only protocol version accepted in the `jsonrpc` member
pub const JSONRPC_VERSION: &str = "2.0";

/// Request ID (string or number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric ID
    Number(i64),
    /// String ID
    String(String),
}

impl RequestId {
    /// Pull a usable id out of a raw message, if it has one
    #[must_use]
    pub fn from_message(message: &Value) -> Option<Self> {
        message
            .get("id")
            .and_then(|id| Self::deserialize(id).ok())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::String(s) => s.fmt(f),
        }
    }
}

/// Request expecting a response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Request ID
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Parameters
    #[serde(default)]
    pub params: Option<Value>,
}

/// Notification: a method call without an id
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
    /// Method name
    pub method: String,
}

/// Anything a client may send on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request
    Request(JsonRpcRequest),
    /// Notification
    Notification(JsonRpcNotification),
    /// Response to a server-initiated request; the gateway never sends any
    Response {
        /// Echoed request ID
        id: Value,
        /// `result` or `error` member
        #[serde(alias = "error")]
        result: Value,
    },
}

/// Response frame.
///
/// `id` is serialized as `null` when the request could not be read far enough
/// to recover it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Request ID
    pub id: Option<RequestId>,
    /// Result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error (on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn reply(id: Option<RequestId>, outcome: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
            error,
        }
    }

    /// Success response
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::reply(Some(id), Ok(result))
    }

    /// Error response
    pub fn error(id: Option<RequestId>, code: i32, message: impl Into<String>) -> Self {
        Self::reply(id, Err(JsonRpcError::new(code, message)))
    }

    /// Error response carrying structured `data`
    pub fn error_with_data(
        id: Option<RequestId>,
        code: i32,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        let mut error = JsonRpcError::new(code, message);
        error.data = Some(data);
        Self::reply(id, Err(error))
    }
}

/// Error member of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Optional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}
