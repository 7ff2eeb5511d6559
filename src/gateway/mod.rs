//! MCP server implementation

mod server;

pub use server::McpServer;
