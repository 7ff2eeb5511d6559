//! MCP Protocol types (version 2025-11-25)

mod messages;
mod types;

pub use messages::*;
pub use types::*;

/// MCP Protocol version
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Protocol versions this server can speak, newest first
pub const SUPPORTED_VERSIONS: &[&str] = &["2025-11-25", "2025-06-18", "2025-03-26", "2024-11-05"];

/// Pick the protocol version for a session.
///
/// A supported client version is echoed back; anything else gets the newest
/// version we support and the client decides whether to continue.
#[must_use]
pub fn negotiate_version(client_version: &str) -> &'static str {
    SUPPORTED_VERSIONS
        .iter()
        .find(|v| **v == client_version)
        .copied()
        .unwrap_or(PROTOCOL_VERSION)
}
