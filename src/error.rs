//! Error types for the Amadeus MCP gateway

use std::io;

use thiserror::Error;

use crate::upstream::AuthError;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
///
/// Upstream HTTP failures (4xx/5xx) and transport failures of a forwarded
/// request are not represented here: the forwarder folds them into a
/// [`ForwardResult`](crate::upstream::ForwardResult) with `is_error` set.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration / credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied tool input rejected before any network I/O
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Token exchange with the upstream failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The stdio side of the session broke
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error with an explicit JSON-RPC code, e.g. an unknown tool
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// Error code
        code: i32,
        /// Error message
        message: String,
        /// Optional data
        data: Option<serde_json::Value>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a JSON-RPC error
    pub fn json_rpc(code: i32, message: impl Into<String>) -> Self {
        Self::JsonRpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Convert to JSON-RPC error code
    #[must_use]
    pub fn to_rpc_code(&self) -> i32 {
        match self {
            Self::JsonRpc { code, .. } => *code,
            Self::Validation(_) => rpc_codes::INVALID_PARAMS,
            Self::Auth(_) => rpc_codes::SERVER_ERROR_START,
            _ => rpc_codes::INTERNAL_ERROR,
        }
    }
}

/// Standard JSON-RPC error codes
pub mod rpc_codes {
    /// Parse error - Invalid JSON
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - Not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Implementation-defined server error (token exchange failures)
    pub const SERVER_ERROR_START: i32 = -32000;
}
