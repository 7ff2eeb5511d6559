//! MCP tools backed by Amadeus operations
//!
//! - [`catalog`]: the declarative tool table
//! - [`schema`]: argument validation with safe coercion
//! - [`registry`]: placement of arguments and dispatch to the forwarder

pub mod catalog;
mod registry;
pub mod schema;

pub use catalog::{GENERIC_TOOL, Location, Param, ParamType, TOOLS, ToolKind, ToolSpec};
pub use registry::ToolRegistry;
