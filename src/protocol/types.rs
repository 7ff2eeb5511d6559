//! MCP payloads for the tools surface

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Human-readable title reported in `serverInfo`
pub const SERVER_TITLE: &str = "Amadeus MCP Gateway";

/// A tool as advertised by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Tool name, e.g. `search_flight_offers`
    pub name: String,
    /// Short display title
    pub title: String,
    /// What the tool does, shown to the model
    pub description: String,
    /// JSON Schema of the `arguments` object
    pub input_schema: Value,
    /// Behaviour hints
    pub annotations: ToolAnnotations,
}

/// Behaviour hints derived from the upstream operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Nothing is created or changed upstream
    pub read_only_hint: bool,
    /// Cancels or deletes something upstream
    pub destructive_hint: bool,
    /// Repeating the call has no further effect
    pub idempotent_hint: bool,
    /// Talks to a system outside the gateway
    pub open_world_hint: bool,
}

/// One content item of a tool result. Upstream payloads are always text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Text content
    Text {
        /// Payload text
        text: String,
    },
}

/// `tools/list` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsListResult {
    /// Every tool, in catalog order
    pub tools: Vec<Tool>,
    /// The catalog is never paginated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// `tools/call` params
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsCallParams {
    /// Tool to run
    pub name: String,
    /// Raw arguments, validated against the tool's schema later
    #[serde(default)]
    pub arguments: Value,
}

/// `tools/call` result: a single text item and an error flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCallResult {
    /// Content items
    pub content: Vec<Content>,
    /// Upstream error, transport failure or rejected credentials
    #[serde(default)]
    pub is_error: bool,
}

impl ToolsCallResult {
    /// Wrap `text` as the only content item
    pub fn text(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error,
        }
    }

    /// Concatenated text of all content items
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|Content::Text { text }| text.as_str())
            .collect()
    }
}

/// `initialize` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Negotiated protocol version
    pub protocol_version: String,
    /// Advertised capabilities
    pub capabilities: ServerCapabilities,
    /// Server identity
    pub server_info: ServerInfo,
    /// Usage hints for the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeResult {
    /// Result for `protocol_version`; empty instructions are omitted
    #[must_use]
    pub fn new(protocol_version: &str, instructions: &str) -> Self {
        Self {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: ServerInfo::default(),
            instructions: (!instructions.is_empty()).then(|| instructions.to_string()),
        }
    }
}

/// Server identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some(SERVER_TITLE.to_string()),
        }
    }
}

/// Capabilities; only tools are offered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tools capability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// The tool table is static, so `listChanged` stays false
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// `notifications/tools/list_changed` support
    #[serde(default)]
    pub list_changed: bool,
}
