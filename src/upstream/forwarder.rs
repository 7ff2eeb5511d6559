//! Authenticated request forwarding
//!
//! [`RequestForwarder::forward`] only returns `Err` for local failures and
//! token exchange failures. Upstream 4xx/5xx answers and transport failures
//! of the forwarded call come back as an `Ok(ForwardResult)` with
//! `is_error` set, so callers only ever inspect one flag.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::form_urlencoded;

use super::credentials::{Credentials, Endpoint};
use super::token::TokenSource;
use super::{DEFAULT_REQUEST_TIMEOUT, error_chain};
use crate::{Error, Result};

/// Content type used when the caller does not pick one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// HTTP methods the gateway forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// All supported methods
    pub const ALL: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Upper-case method name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this method usually carry a body
    #[must_use]
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Unsupported HTTP method '{s}': expected one of GET, POST, PUT, PATCH, DELETE"
                ))
            })
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// One upstream call, fully resolved
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute-from-root resource path (`/v2/...`)
    pub path: String,
    /// Query parameters
    pub query: Map<String, Value>,
    /// Optional request body
    pub body: Option<Value>,
    /// Extra request headers; must not contain `authorization`
    pub headers: BTreeMap<String, String>,
    /// Content type of the body
    pub content_type: String,
    /// Bound for the token exchange and for the request itself
    pub timeout: Duration,
}

impl ForwardRequest {
    /// Request with no query, body or extra headers
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Map::new(),
            body: None,
            headers: BTreeMap::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the query parameters
    #[must_use]
    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the content type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Uniform outcome of a forwarded call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardResult {
    /// Response text, or a description of the failure
    pub payload: String,
    /// `true` for upstream status >= 400 and for transport failures
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ForwardResult {
    fn transport_failure(status: Option<StatusCode>, err: &reqwest::Error) -> Self {
        let status = status.or_else(|| err.status()).map_or(500, |s| s.as_u16());
        Self {
            payload: format!("Forwarding error ({status}): {}", error_chain(err)),
            is_error: true,
        }
    }
}

/// Issues authenticated upstream calls
pub struct RequestForwarder {
    client: Client,
    endpoint: Endpoint,
    tokens: Arc<dyn TokenSource>,
}

impl RequestForwarder {
    /// Create a forwarder sharing `client` and asking `tokens` for credentials
    #[must_use]
    pub fn new(client: Client, endpoint: Endpoint, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client,
            endpoint,
            tokens,
        }
    }

    /// Forward `request` to the realm selected by `credentials`.
    ///
    /// A failed token exchange returns `Err(Error::Auth)` and the resource
    /// request is never sent. A path that URL parsing would rewrite is a
    /// `Err(Error::Validation)`, checked before any token is requested.
    pub async fn forward(
        &self,
        credentials: &Credentials,
        request: ForwardRequest,
    ) -> Result<ForwardResult> {
        let url = self.endpoint.resolve(credentials, &request.path)?;
        let token = self.tokens.get_token(credentials, request.timeout).await?;

        debug!(
            method = %request.method,
            path = %request.path,
            service = credentials.service_name(),
            "Forwarding request"
        );

        let mut headers = build_headers(&request.headers);
        insert_header(&mut headers, AUTHORIZATION, &token.authorization());
        insert_header(&mut headers, CONTENT_TYPE, &request.content_type);

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(headers)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&query_pairs(&request.query));
        }
        if let Some(ref body) = request.body {
            builder = builder.body(encode_body(body, &request.content_type));
        }

        let result = match builder.send().await {
            Ok(response) => normalize(response).await,
            Err(e) => {
                warn!(path = %request.path, error = %e, "Upstream request failed");
                ForwardResult::transport_failure(None, &e)
            }
        };

        debug!(
            path = %request.path,
            is_error = result.is_error,
            bytes = result.payload.len(),
            "Upstream request finished"
        );
        Ok(result)
    }
}

/// Turn a response into a [`ForwardResult`] without failing on status.
async fn normalize(response: Response) -> ForwardResult {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

    match response.text().await {
        Ok(text) => ForwardResult {
            payload: if is_json { compact_json(text) } else { text },
            is_error: status.as_u16() >= 400,
        },
        Err(e) => ForwardResult::transport_failure(Some(status), &e),
    }
}

/// Re-serialize a JSON body compactly; a bare JSON string is unwrapped and
/// unparsable bodies are kept verbatim.
fn compact_json(text: String) -> String {
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::String(s)) => s,
        Ok(value) => value.to_string(),
        Err(_) => text,
    }
}

fn build_headers(extra: &BTreeMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in extra {
        match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid header"),
        }
    }
    headers
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match value.parse::<HeaderValue>() {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, "Skipping invalid header value"),
    }
}

/// Flatten query arguments into string pairs.
///
/// Arrays become comma-separated lists, which is how the upstream expects
/// multi-valued parameters such as `hotelIds`.
pub(crate) fn query_pairs(query: &Map<String, Value>) -> Vec<(String, String)> {
    query
        .iter()
        .filter_map(|(key, value)| query_value(value).map(|v| (key.clone(), v)))
        .collect()
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Some(value.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn encode_body(body: &Value, content_type: &str) -> String {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match body {
        Value::Object(map) if mime == "application/x-www-form-urlencoded" => {
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query_pairs(map))
                .finish()
        }
        Value::String(s) if !mime.contains("json") => s.clone(),
        other => other.to_string(),
    }
}
