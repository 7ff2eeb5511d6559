//! Authentication-and-forwarding core
//!
//! - [`paths`]: allowlist of upstream resource paths
//! - [`token`]: OAuth2 client-credentials exchange
//! - [`forwarder`]: authenticated forwarding with a uniform result shape

mod credentials;
mod forwarder;
pub mod paths;
mod token;

pub use credentials::{Credentials, DEFAULT_ENDPOINT_TEMPLATE, Endpoint, SERVICE_PLACEHOLDER};
pub use forwarder::{
    DEFAULT_CONTENT_TYPE, ForwardRequest, ForwardResult, HttpMethod, RequestForwarder,
};
pub use paths::{PathMatcher, PathTemplate, Segment};
pub use token::{
    AuthError, BearerToken, DEFAULT_TOKEN_TIMEOUT, IssuedToken, TOKEN_PATH, TokenCache,
    TokenProvider, TokenSource,
};

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::{Client, redirect};

use crate::{Error, Result};

/// Upper bound for any per-call timeout, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 60_000;

/// Timeout applied to forwarded calls unless the caller picks one
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Redirects followed before a response is surfaced as-is
pub const MAX_REDIRECTS: usize = 3;

/// Validate a caller-supplied timeout in milliseconds: `(0, 60000]`.
pub fn timeout_from_millis(ms: u64) -> Result<Duration> {
    if ms == 0 || ms > MAX_TIMEOUT_MS {
        return Err(Error::Validation(format!(
            "timeoutMs must be between 1 and {MAX_TIMEOUT_MS}, got {ms}"
        )));
    }
    Ok(Duration::from_millis(ms))
}

/// Build the process-wide HTTP client shared by token and resource calls.
pub fn build_http_client(max_redirects: usize) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("amadeus-mcp-gateway/", env!("CARGO_PKG_VERSION")))
        .redirect(redirect::Policy::limited(max_redirects))
        .build()?;
    Ok(client)
}

/// Render an error and its sources as one line.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
