//! Amadeus MCP Gateway Library
//!
//! Exposes the Amadeus Self-Service travel APIs as MCP tools over stdio,
//! handling OAuth2 client-credentials authentication transparently.
//!
//! # Layout
//!
//! - [`upstream`]: path allowlist, token acquisition and request forwarding
//! - [`tools`]: declarative tool table, argument validation and dispatch
//! - [`gateway`]: JSON-RPC method handling
//! - [`transport`]: line-delimited stdio transport
//!
//! # Protocol Version
//!
//! Implements MCP protocol versions 2024-11-05 through 2025-11-25.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod tools;
pub mod transport;
pub mod upstream;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// Logs always go to stderr: stdout carries protocol frames.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init(),
    };

    installed.map_err(|e| Error::Internal(format!("failed to install tracing subscriber: {e}")))
}
