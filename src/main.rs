//! Amadeus MCP Gateway - travel APIs as MCP tools over stdio

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use amadeus_mcp_gateway::{
    Result,
    cli::{Cli, Command},
    config::Config,
    gateway::McpServer,
    setup_tracing,
    tools::{TOOLS, ToolRegistry},
    transport,
    upstream::{
        Credentials, Endpoint, PathMatcher, RequestForwarder, TokenProvider, TokenSource,
        build_http_client,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Handle subcommands that need no credentials
    match cli.command {
        Some(Command::Tools { json }) => return run_tools(json),
        Some(Command::CheckPath { ref path }) => return run_check_path(path),
        _ => {}
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Auth) => run_auth(&config).await,
        Some(Command::Call { tool, args }) => run_call(&config, &tool, &args).await,
        _ => run_server(&config).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref service_name) = cli.service_name {
        config.upstream.service_name.clone_from(service_name);
    }
    if cli.cache_tokens {
        config.token_cache.enabled = true;
    }
    Ok(config)
}

/// Everything needed to talk to the upstream
struct Upstream {
    client: reqwest::Client,
    endpoint: Endpoint,
    credentials: Credentials,
}

impl Upstream {
    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            credentials: config.upstream.credentials()?,
            endpoint: config.upstream.endpoint()?,
            client: build_http_client(config.upstream.max_redirects)?,
        })
    }

    fn token_provider(&self, config: &Config) -> TokenProvider {
        let provider = TokenProvider::new(self.client.clone(), self.endpoint.clone());
        match config.token_cache.build() {
            Some(cache) => provider.with_cache(cache),
            None => provider,
        }
    }

    fn registry(self, config: &Config) -> ToolRegistry {
        let tokens: Arc<dyn TokenSource> = Arc::new(self.token_provider(config));
        let forwarder = RequestForwarder::new(self.client, self.endpoint, tokens);
        ToolRegistry::new(forwarder, self.credentials)
            .with_default_timeout(config.upstream.request_timeout)
    }
}

/// Run the MCP server on stdio
async fn run_server(config: &Config) -> ExitCode {
    let upstream = match Upstream::from_config(config) {
        Ok(u) => u,
        Err(e) => {
            error!("Failed to initialize upstream: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        service = upstream.credentials.service_name(),
        base_url = %upstream.endpoint.base_url(upstream.credentials.service_name()),
        tools = TOOLS.len(),
        token_cache = config.token_cache.enabled,
        "Starting Amadeus MCP Gateway"
    );

    let server = Arc::new(McpServer::new(
        upstream.registry(config),
        config.server.instructions.clone(),
    ));

    if let Err(e) = transport::run_stdio(server).await {
        error!("Transport error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}

/// Print the tool table
fn run_tools(json: bool) -> ExitCode {
    if json {
        let tools: Vec<_> = TOOLS.iter().map(|t| t.to_tool()).collect();
        match serde_json::to_string_pretty(&tools) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("❌ Failed to serialize tools: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{} tools:\n", TOOLS.len());
    for tool in TOOLS {
        let target = match tool.method() {
            Some(method) => format!("{method} {}", tool.path().unwrap_or_default()),
            None => "any allowlisted path".to_string(),
        };
        println!("  {:<32} {target}", tool.name);
    }
    ExitCode::SUCCESS
}

/// Check a path against the allowlist
fn run_check_path(path: &str) -> ExitCode {
    if PathMatcher::amadeus().is_allowed(path) {
        println!("✅ {path} is allowed");
        ExitCode::SUCCESS
    } else {
        println!("❌ {path} is not on the allowlist");
        ExitCode::FAILURE
    }
}

/// Request a token to verify credentials
async fn run_auth(config: &Config) -> ExitCode {
    let upstream = match Upstream::from_config(config) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let provider = upstream.token_provider(config);
    match provider
        .fetch_token(&upstream.credentials, config.upstream.token_timeout)
        .await
    {
        Ok(issued) => {
            println!(
                "✅ Authenticated against {}",
                upstream.endpoint.base_url(upstream.credentials.service_name())
            );
            if let Some(lifetime) = issued.expires_in {
                println!("   Token valid for {}s", lifetime.as_secs());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Authentication failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Call a single tool and print its result
async fn run_call(config: &Config, tool: &str, args: &str) -> ExitCode {
    let arguments: serde_json::Value = match serde_json::from_str(args) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("❌ Invalid JSON arguments: {e}");
            return ExitCode::FAILURE;
        }
    };

    let registry = match Upstream::from_config(config) {
        Ok(upstream) => upstream.registry(config),
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    match registry.call(tool, &arguments).await {
        Ok(result) => {
            let text = result.joined_text();
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => println!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_else(|_| text.clone())
                ),
                Err(_) => println!("{text}"),
            }
            if result.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
