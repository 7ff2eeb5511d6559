//! Transports the MCP server is reachable over

mod stdio;

pub use self::stdio::{run_stdio, serve};
