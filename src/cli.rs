//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Amadeus MCP Gateway - travel APIs as MCP tools over stdio
#[derive(Parser, Debug)]
#[command(name = "amadeus-mcp-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "AMADEUS_GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Upstream service name, e.g. `test` or `production` (overrides config)
    #[arg(long, env = "AMADEUS_SERVICE_NAME", global = true)]
    pub service_name: Option<String>,

    /// Reuse access tokens until shortly before they expire
    #[arg(long, global = true)]
    pub cache_tokens: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "AMADEUS_GATEWAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "AMADEUS_GATEWAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve MCP over stdio (default)
    Serve,

    /// List the tools the gateway exposes
    Tools {
        /// Print full MCP tool definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call one tool and print its result
    Call {
        /// Tool name
        #[arg(required = true)]
        tool: String,

        /// JSON arguments to pass to the tool
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Check whether a path is on the upstream allowlist
    CheckPath {
        /// Resource path, e.g. /v1/booking/flight-orders/ABC123
        #[arg(required = true)]
        path: String,
    },

    /// Verify credentials by requesting an access token
    Auth,
}
