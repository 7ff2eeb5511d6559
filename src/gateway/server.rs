//! MCP method dispatch

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::Error;
use crate::error::rpc_codes;
use crate::protocol::{
    InitializeResult, JSONRPC_VERSION, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, RequestId,
    ToolsCallParams, ToolsListResult, negotiate_version,
};
use crate::tools::ToolRegistry;

/// Answers MCP requests against a [`ToolRegistry`]
pub struct McpServer {
    registry: ToolRegistry,
    instructions: String,
}

impl McpServer {
    /// Create a server
    pub fn new(registry: ToolRegistry, instructions: impl Into<String>) -> Self {
        Self {
            registry,
            instructions: instructions.into(),
        }
    }

    /// Handle one raw protocol line.
    ///
    /// Returns `None` for notifications and stray responses.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparsable message");
                return Some(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        let id = RequestId::from_message(&value);

        if value.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Some(JsonRpcResponse::error(
                id,
                rpc_codes::INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }

        let answers_us = value.get("result").is_some() || value.get("error").is_some();
        if id.is_none() && value.get("id").is_some() && !answers_us {
            return Some(JsonRpcResponse::error(
                None,
                rpc_codes::INVALID_REQUEST,
                "Invalid request: id must be a string or integer",
            ));
        }

        match serde_json::from_value::<JsonRpcMessage>(value) {
            Ok(JsonRpcMessage::Request(request)) => Some(self.handle_request(request).await),
            Ok(JsonRpcMessage::Notification(notification)) => {
                debug!(method = %notification.method, "Notification");
                None
            }
            Ok(JsonRpcMessage::Response { .. }) => {
                debug!("Ignoring unsolicited response");
                None
            }
            Err(e) => Some(JsonRpcResponse::error(
                id,
                rpc_codes::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    /// Dispatch a request by method
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest { id, method, params } = request;
        debug!(%id, method = %method, "Request");

        match method.as_str() {
            "initialize" => self.handle_initialize(id, params.as_ref()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params).await,
            _ => JsonRpcResponse::error(
                Some(id),
                rpc_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        }
    }

    /// Handle initialize request with version negotiation
    fn handle_initialize(&self, id: RequestId, params: Option<&Value>) -> JsonRpcResponse {
        let client_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or("2024-11-05");
        let negotiated = negotiate_version(client_version);
        debug!(client = client_version, negotiated, "Protocol version negotiation");

        let result = InitializeResult::new(negotiated, &self.instructions);
        success(id, &result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.registry.list(),
            next_cursor: None,
        };
        success(id, &result)
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolsCallParams = match serde_json::from_value(params.unwrap_or(Value::Null)) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INVALID_PARAMS,
                    format!("Invalid tools/call params: {e}"),
                );
            }
        };

        match self.registry.call(&params.name, &params.arguments).await {
            Ok(result) => success(id, &result),
            Err(e) => {
                debug!(tool = %params.name, error = %e, "Tool call rejected");
                error_response(id, e)
            }
        }
    }
}

fn success<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(Some(id), rpc_codes::INTERNAL_ERROR, e.to_string()),
    }
}

fn error_response(id: RequestId, error: Error) -> JsonRpcResponse {
    match error {
        Error::JsonRpc {
            code,
            message,
            data: Some(data),
        } => JsonRpcResponse::error_with_data(Some(id), code, message, data),
        Error::JsonRpc { code, message, .. } => JsonRpcResponse::error(Some(id), code, message),
        other => JsonRpcResponse::error(Some(id), other.to_rpc_code(), other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::upstream::{
        AuthError, BearerToken, Credentials, Endpoint, RequestForwarder, TokenSource,
    };

    struct Unreachable;

    #[async_trait::async_trait]
    impl TokenSource for Unreachable {
        async fn get_token(
            &self,
            _credentials: &Credentials,
            _timeout: Duration,
        ) -> Result<BearerToken, AuthError> {
            Err(AuthError::Transport("connection refused".to_string()))
        }
    }

    fn server() -> McpServer {
        let forwarder = RequestForwarder::new(
            reqwest::Client::new(),
            Endpoint::new("http://127.0.0.1:1").unwrap(),
            Arc::new(Unreachable),
        );
        let registry =
            ToolRegistry::new(forwarder, Credentials::new("test", "key", "secret").unwrap());
        McpServer::new(registry, "Use the tools.")
    }

    async fn roundtrip(line: &str) -> Value {
        let response = server().handle_line(line).await.expect("response");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn initialize_negotiates_version() {
        let resp = roundtrip(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
        )
        .await;
        assert_eq!(resp["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(resp["result"]["serverInfo"]["name"], "amadeus-mcp-gateway");
        assert_eq!(resp["result"]["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(resp["result"]["instructions"], "Use the tools.");
    }

    #[tokio::test]
    async fn unusable_id_is_an_invalid_request() {
        for line in [
            r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":{"n":1},"method":"tools/list"}"#,
        ] {
            let resp = roundtrip(line).await;
            assert_eq!(resp["id"], Value::Null, "{line}");
            assert_eq!(resp["error"]["code"], rpc_codes::INVALID_REQUEST, "{line}");
        }
    }

    #[tokio::test]
    async fn response_with_odd_id_is_ignored() {
        let line = r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"x"}}"#;
        assert!(server().handle_line(line).await.is_none());
    }

    #[tokio::test]
    async fn ping_returns_empty_result() {
        let resp = roundtrip(r#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#).await;
        assert_eq!(resp["id"], "a");
        assert_eq!(resp["result"], json!({}));
    }

    #[tokio::test]
    async fn unknown_method_is_not_found() {
        let resp = roundtrip(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#).await;
        assert_eq!(resp["error"]["code"], rpc_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn parse_error_has_null_id() {
        let resp = roundtrip("{not json").await;
        assert_eq!(resp["id"], Value::Null);
        assert_eq!(resp["error"]["code"], rpc_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn wrong_version_is_invalid_request() {
        let resp = roundtrip(r#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#).await;
        assert_eq!(resp["id"], 3);
        assert_eq!(resp["error"]["code"], rpc_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let server = server();
        assert!(
            server
                .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn invalid_arguments_are_invalid_params() {
        let resp = roundtrip(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"amadeus_api_request","arguments":{"method":"GET","path":"/v1/unknown/endpoint"}}}"#,
        )
        .await;
        assert_eq!(resp["error"]["code"], rpc_codes::INVALID_PARAMS);
        assert!(
            resp["error"]["message"]
                .as_str()
                .unwrap()
                .contains("not an allowed Amadeus endpoint")
        );
    }

    #[tokio::test]
    async fn missing_tool_name_is_invalid_params() {
        let resp =
            roundtrip(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{}}"#).await;
        assert_eq!(resp["error"]["code"], rpc_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn auth_failure_is_tool_error_result() {
        let resp = roundtrip(
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"get_activity","arguments":{"activityId":"23642"}}}"#,
        )
        .await;
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(
            resp["result"]["content"][0]["text"],
            "Authentication failed: token request failed: connection refused"
        );
    }
}
