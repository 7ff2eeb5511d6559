//! Tool dispatch: validate arguments, place them, forward.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::catalog::{self, Location, TOOLS, ToolKind, ToolSpec};
use super::schema;
use crate::error::rpc_codes;
use crate::protocol::{Tool, ToolsCallResult};
use crate::upstream::paths::is_safe_segment;
use crate::upstream::{
    Credentials, DEFAULT_CONTENT_TYPE, DEFAULT_REQUEST_TIMEOUT, ForwardRequest, HttpMethod,
    PathMatcher, RequestForwarder, timeout_from_millis,
};
use crate::{Error, Result};

/// Serves the tool table against one set of credentials
pub struct ToolRegistry {
    forwarder: RequestForwarder,
    credentials: Credentials,
    matcher: &'static PathMatcher,
    default_timeout: Duration,
}

impl ToolRegistry {
    /// Create a registry for the Amadeus allowlist
    #[must_use]
    pub fn new(forwarder: RequestForwarder, credentials: Credentials) -> Self {
        Self {
            forwarder,
            credentials,
            matcher: PathMatcher::amadeus(),
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Timeout for calls that do not set `timeoutMs`
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// MCP definitions of every tool
    #[must_use]
    pub fn list(&self) -> Vec<Tool> {
        TOOLS.iter().map(ToolSpec::to_tool).collect()
    }

    /// Validate `arguments` for tool `name` and build the upstream request.
    ///
    /// Performs no I/O.
    pub fn prepare(&self, name: &str, arguments: &Value) -> Result<ForwardRequest> {
        let spec = catalog::find(name).ok_or_else(|| {
            Error::json_rpc(rpc_codes::INVALID_PARAMS, format!("Unknown tool: {name}"))
        })?;

        let args = schema::validate(spec.params, arguments).map_err(|violations| {
            Error::Validation(schema::format_violations(spec.name, spec.params, &violations))
        })?;

        match spec.kind {
            ToolKind::Fixed { method, path } => self.prepare_fixed(spec, method, path, args),
            ToolKind::Generic => self.prepare_generic(args),
        }
    }

    /// Run tool `name`.
    ///
    /// Invalid input is an `Err`; a failed token exchange and any upstream
    /// outcome come back as a tool result.
    pub async fn call(&self, name: &str, arguments: &Value) -> Result<ToolsCallResult> {
        let request = self.prepare(name, arguments)?;
        info!(tool = name, method = %request.method, path = %request.path, "Calling tool");

        match self.forwarder.forward(&self.credentials, request).await {
            Ok(result) => {
                debug!(tool = name, is_error = result.is_error, "Tool finished");
                Ok(ToolsCallResult::text(result.payload, result.is_error))
            }
            Err(Error::Auth(e)) => {
                warn!(tool = name, error = %e, "Token exchange failed");
                Ok(ToolsCallResult::text(format!("Authentication failed: {e}"), true))
            }
            Err(e) => Err(e),
        }
    }

    fn prepare_fixed(
        &self,
        spec: &ToolSpec,
        method: HttpMethod,
        path: &str,
        mut args: Map<String, Value>,
    ) -> Result<ForwardRequest> {
        let path = fill_path(path, &args)?;

        let mut query = Map::new();
        let mut fields = Map::new();
        let mut payload = None;
        for param in spec.params {
            let Some(value) = args.remove(param.name) else {
                continue;
            };
            match param.location {
                Location::Query => {
                    query.insert(param.name.to_string(), value);
                }
                Location::Body => {
                    fields.insert(param.name.to_string(), value);
                }
                Location::Payload => payload = Some(value),
                Location::Path | Location::Control => {}
            }
        }

        let body = match payload {
            Some(Value::Object(mut body)) => {
                body.extend(fields);
                Some(Value::Object(body))
            }
            Some(other) => Some(other),
            None if !fields.is_empty() => Some(Value::Object(fields)),
            None => None,
        };

        let mut request = ForwardRequest::new(method, path)
            .with_query(query)
            .with_timeout(self.default_timeout);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        Ok(request)
    }

    fn prepare_generic(&self, mut args: Map<String, Value>) -> Result<ForwardRequest> {
        let method: HttpMethod = string_arg(&args, "method").unwrap_or_default().parse()?;
        let path = string_arg(&args, "path").unwrap_or_default().to_string();

        if !path.starts_with('/') {
            return Err(Error::Validation(format!("path must start with '/', got '{path}'")));
        }
        if path.contains(['?', '#']) {
            return Err(Error::Validation(
                "path must not contain a query string or fragment; pass parameters in 'query'"
                    .to_string(),
            ));
        }
        if !self.matcher.is_allowed(&path) {
            return Err(Error::Validation(format!(
                "path '{path}' is not an allowed Amadeus endpoint"
            )));
        }

        let timeout = match args.get("timeoutMs").and_then(Value::as_u64) {
            Some(ms) => timeout_from_millis(ms)?,
            None => self.default_timeout,
        };
        let content_type = string_arg(&args, "contentType")
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let mut request = ForwardRequest::new(method, path)
            .with_content_type(content_type)
            .with_timeout(timeout);

        if let Some(Value::Object(headers)) = args.remove("headers") {
            for (name, value) in headers {
                if name.eq_ignore_ascii_case("authorization") {
                    return Err(Error::Validation(
                        "the authorization header is set by the gateway and must not be supplied"
                            .to_string(),
                    ));
                }
                let Value::String(value) = value else {
                    return Err(Error::Validation(format!(
                        "header '{name}' must have a string value"
                    )));
                };
                request = request.with_header(name, value);
            }
        }
        if let Some(Value::Object(query)) = args.remove("query") {
            request = request.with_query(query);
        }
        if let Some(body) = args.remove("body") {
            request = request.with_body(body);
        }

        Ok(request)
    }
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Substitute `:name` segments with percent-encoded argument values.
fn fill_path(template: &str, args: &Map<String, Value>) -> Result<String> {
    let segments = template
        .split('/')
        .map(|segment| {
            let Some(name) = segment.strip_prefix(':') else {
                return Ok(segment.to_string());
            };
            let value = string_arg(args, name)
                .ok_or_else(|| Error::Validation(format!("missing path parameter '{name}'")))?;
            if !is_safe_segment(value) {
                return Err(Error::Validation(format!(
                    "parameter '{name}' must be a single path segment, got '{value}'"
                )));
            }
            Ok(encode_segment(value))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(segments.join("/"))
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
///
/// Existing `%XX` escapes are kept: upstream ids such as flight order ids
/// are handed out already encoded.
fn encode_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find('%') {
        let (head, tail) = rest.split_at(idx);
        out.push_str(&urlencoding::encode(head));
        if is_escape(tail) {
            out.push_str(&tail[..3]);
            rest = &tail[3..];
        } else {
            out.push_str("%25");
            rest = &tail[1..];
        }
    }
    out.push_str(&urlencoding::encode(rest));
    out
}

/// Whether `s` starts with a `%XX` escape
fn is_escape(s: &str) -> bool {
    matches!(s.as_bytes(), [b'%', hi, lo, ..] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::upstream::{AuthError, BearerToken, Endpoint, TokenSource};

    struct NoTokens;

    #[async_trait::async_trait]
    impl TokenSource for NoTokens {
        async fn get_token(
            &self,
            _credentials: &Credentials,
            _timeout: Duration,
        ) -> std::result::Result<BearerToken, AuthError> {
            Err(AuthError::Rejected {
                status: 401,
                body: r#"{"error":"invalid_client"}"#.to_string(),
            })
        }
    }

    fn registry() -> ToolRegistry {
        let forwarder = RequestForwarder::new(
            reqwest::Client::new(),
            Endpoint::new("http://127.0.0.1:1").unwrap(),
            Arc::new(NoTokens),
        );
        ToolRegistry::new(forwarder, Credentials::new("test", "key", "secret").unwrap())
    }

    #[test]
    fn lists_every_tool() {
        let tools = registry().list();
        assert_eq!(tools.len(), TOOLS.len());
        assert!(tools.iter().any(|t| t.name == "amadeus_api_request"));
    }

    #[test]
    fn query_params_are_placed_and_coerced() {
        let request = registry()
            .prepare(
                "search_flight_offers",
                &json!({
                    "originLocationCode": "SYD",
                    "destinationLocationCode": "BKK",
                    "departureDate": "2026-11-01",
                    "adults": "2",
                }),
            )
            .unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "/v2/shopping/flight-offers");
        assert_eq!(request.query["adults"], json!(2));
        assert!(request.body.is_none());
        assert_eq!(request.timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn path_params_are_substituted_and_encoded() {
        let request = registry()
            .prepare("get_flight_order", &json!({"flightOrderId": "ORDER:1+2"}))
            .unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "/v1/booking/flight-orders/ORDER%3A1%2B2");
        assert!(request.query.is_empty());

        let cancel = registry()
            .prepare("cancel_transfer", &json!({"orderId": "VEG123", "confirmNbr": 9}))
            .unwrap();
        assert_eq!(cancel.path, "/v1/ordering/transfer-orders/VEG123/transfers/cancellation");
        assert_eq!(cancel.query["confirmNbr"], json!("9"));
    }

    #[test]
    fn encoded_ids_are_not_encoded_twice() {
        let id = "eJzTd9f3NjIJdzYBAAsKAkI%3D";
        let fixed = registry()
            .prepare("get_flight_order", &json!({"flightOrderId": id}))
            .unwrap();
        assert_eq!(fixed.path, format!("/v1/booking/flight-orders/{id}"));

        let generic = registry()
            .prepare(
                "amadeus_api_request",
                &json!({"method": "GET", "path": format!("/v1/booking/flight-orders/{id}")}),
            )
            .unwrap();
        assert_eq!(fixed.path, generic.path);
    }

    #[test]
    fn path_params_cannot_escape_the_template() {
        for bad in ["..", "a/b", "%2e%2e", "x?y=1", ".\t.", "AB\n", "A B"] {
            let err = registry()
                .prepare("get_flight_order", &json!({"flightOrderId": bad}))
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn payload_becomes_the_body() {
        let body = json!({"data": {"type": "flight-offers-pricing", "flightOffers": []}});
        let request = registry()
            .prepare("price_flight_offers", &json!({"body": body, "forceClass": false}))
            .unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body, Some(body));
        assert_eq!(request.query["forceClass"], json!(false));
    }

    #[test]
    fn body_fields_merge_into_payload() {
        const PARAMS: &[catalog::Param] = &[
            catalog::Param::payload("body"),
            catalog::Param::body("currency", catalog::ParamType::String, "currency"),
        ];
        let spec = ToolSpec {
            name: "demo",
            title: "demo",
            description: "demo",
            kind: ToolKind::Fixed { method: HttpMethod::Post, path: "/v1/demo" },
            params: PARAMS,
        };
        let args = schema::validate(spec.params, &json!({"body": {"a": 1}, "currency": "EUR"}))
            .unwrap();
        let request = registry()
            .prepare_fixed(&spec, HttpMethod::Post, "/v1/demo", args)
            .unwrap();
        assert_eq!(request.body, Some(json!({"a": 1, "currency": "EUR"})));
    }

    #[test]
    fn invalid_arguments_list_valid_params() {
        let err = registry()
            .prepare("search_activities", &json!({"latitude": 41.39}))
            .unwrap_err();
        let Error::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("Parameter 'longitude': required parameter is missing"));
        assert!(msg.contains("Valid parameters for this tool"));
    }

    #[test]
    fn unknown_tool_is_invalid_params() {
        let err = registry().prepare("book_spaceship", &json!({})).unwrap_err();
        assert_eq!(err.to_rpc_code(), rpc_codes::INVALID_PARAMS);
    }

    #[test]
    fn generic_request_is_built_from_arguments() {
        let request = registry()
            .prepare(
                "amadeus_api_request",
                &json!({
                    "method": "GET",
                    "path": "/v1/reference-data/airlines",
                    "query": {"airlineCodes": "BA"},
                    "headers": {"X-Request-Id": "abc"},
                    "timeoutMs": 5000,
                }),
            )
            .unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.query["airlineCodes"], json!("BA"));
        assert_eq!(request.headers["X-Request-Id"], "abc");
        assert_eq!(request.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(request.timeout, Duration::from_millis(5000));
    }

    #[test]
    fn generic_request_rejects_disallowed_paths() {
        for path in [
            "/v1/unknown/endpoint",
            "v1/reference-data/airlines",
            "/v1/reference-data/airlines?x=1",
            "/v1/booking/flight-orders/../../admin",
            "/v1/ordering/transfer-orders/.\t./transfers/cancellation",
            "/v1/ordering/transfer-orders/.\r\n./transfers/cancellation",
        ] {
            let err = registry()
                .prepare("amadeus_api_request", &json!({"method": "GET", "path": path}))
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{path:?} should be rejected");
        }
    }

    #[test]
    fn generic_request_rejects_authorization_header() {
        let err = registry()
            .prepare(
                "amadeus_api_request",
                &json!({
                    "method": "GET",
                    "path": "/v1/reference-data/airlines",
                    "headers": {"AUTHORIZATION": "Bearer stolen"},
                }),
            )
            .unwrap_err();
        assert!(err.to_string().contains("authorization header"));
    }

    #[test]
    fn generic_request_rejects_non_string_header_and_bad_timeout() {
        let base = json!({"method": "GET", "path": "/v1/reference-data/airlines"});

        let mut with_header = base.clone();
        with_header["headers"] = json!({"X-Count": 3});
        assert!(registry().prepare("amadeus_api_request", &with_header).is_err());

        for timeout in [0, 60_001] {
            let mut with_timeout = base.clone();
            with_timeout["timeoutMs"] = json!(timeout);
            let err = registry().prepare("amadeus_api_request", &with_timeout).unwrap_err();
            assert_eq!(err.to_rpc_code(), rpc_codes::INVALID_PARAMS);
        }
    }

    #[tokio::test]
    async fn auth_failure_is_a_tool_error() {
        let result = registry()
            .call("get_airlines", &json!({"airlineCodes": ["BA"]}))
            .await
            .unwrap();
        assert!(result.is_error);
        let text = result.joined_text();
        assert!(text.starts_with("Authentication failed: token endpoint returned HTTP 401"));
        assert!(text.contains("invalid_client"));
    }

    #[test]
    fn segment_encoding_keeps_unreserved() {
        assert_eq!(encode_segment("AB-12_x.~"), "AB-12_x.~");
        assert_eq!(encode_segment("a b+c"), "a%20b%2Bc");
        assert_eq!(encode_segment("AkI%3D"), "AkI%3D");
        assert_eq!(encode_segment("100%"), "100%25");
        assert_eq!(encode_segment("%zz%4"), "%25zz%254");
    }
}
