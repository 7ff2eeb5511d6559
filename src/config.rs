//! Configuration management

use std::{env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::upstream::{
    Credentials, DEFAULT_ENDPOINT_TEMPLATE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TOKEN_TIMEOUT,
    Endpoint, MAX_REDIRECTS, MAX_TIMEOUT_MS, TokenCache,
};
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving credentials.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// Upstream API configuration
    pub upstream: UpstreamConfig,
    /// Token cache configuration
    pub token_cache: TokenCacheConfig,
    /// MCP server configuration
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env_files: vec![".env".to_string()],
            upstream: UpstreamConfig::default(),
            token_cache: TokenCacheConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Realm selector, e.g. `test` (supports `env:VAR` and `${VAR:-default}`)
    pub service_name: String,
    /// API key (supports `env:VAR`)
    pub api_key: String,
    /// API secret (supports `env:VAR`)
    pub api_secret: String,
    /// Base URL template; `{service}` is replaced by the service name
    pub base_url: String,
    /// Timeout for forwarded requests
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Timeout for standalone token checks (`auth` command)
    #[serde(with = "humantime_serde")]
    pub token_timeout: Duration,
    /// Redirects followed automatically
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            service_name: "${AMADEUS_SERVICE_NAME:-test}".to_string(),
            api_key: "env:AMADEUS_API_KEY".to_string(),
            api_secret: "env:AMADEUS_API_SECRET".to_string(),
            base_url: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token_timeout: DEFAULT_TOKEN_TIMEOUT,
            max_redirects: MAX_REDIRECTS,
        }
    }
}

impl UpstreamConfig {
    /// Resolve credential references into [`Credentials`].
    ///
    /// Fails before any network activity when the key or secret is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        let service_name = resolve_value(&self.service_name, "service name")?;
        let api_key = resolve_value(&self.api_key, "API key")?;
        let api_secret = resolve_value(&self.api_secret, "API secret")?;
        Credentials::new(service_name, api_key, api_secret)
    }

    /// Base URL resolver
    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::new(&self.base_url)
    }

    /// Check timeouts are within `(0, 60s]`
    pub fn validate(&self) -> Result<()> {
        for (name, timeout) in [
            ("request_timeout", self.request_timeout),
            ("token_timeout", self.token_timeout),
        ] {
            if timeout.is_zero() || timeout > Duration::from_millis(MAX_TIMEOUT_MS) {
                return Err(Error::Config(format!(
                    "upstream.{name} must be between 1ms and {MAX_TIMEOUT_MS}ms, got {}ms",
                    timeout.as_millis()
                )));
            }
        }
        Ok(())
    }
}

/// Token cache configuration
///
/// Off by default: every forwarded call performs its own token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenCacheConfig {
    /// Reuse tokens across calls
    pub enabled: bool,
    /// Upper bound on how long a token is reused
    #[serde(with = "humantime_serde")]
    pub max_ttl: Duration,
    /// Subtracted from the advertised `expires_in`
    #[serde(with = "humantime_serde")]
    pub refresh_margin: Duration,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_ttl: Duration::from_secs(25 * 60),
            refresh_margin: Duration::from_secs(60),
        }
    }
}

impl TokenCacheConfig {
    /// Build the cache if enabled
    #[must_use]
    pub fn build(&self) -> Option<TokenCache> {
        self.enabled
            .then(|| TokenCache::new(self.max_ttl, self.refresh_margin))
    }
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Instructions returned from `initialize`
    pub instructions: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instructions: "Tools for the Amadeus travel APIs: flights, hotels, activities, \
                           transfers, predictions and analytics. Authentication is handled by \
                           the gateway; use amadeus_api_request for allowlisted endpoints \
                           without a dedicated tool."
                .to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(Self::default()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (AMADEUS_GATEWAY_ prefix)
        figment = figment.merge(Env::prefixed("AMADEUS_GATEWAY_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Env files first so ${VAR} and env: references can see them
        config.load_env_files();
        config.expand_env_vars();
        config.upstream.validate()?;

        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                    Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }

    /// Expand ${VAR} and ${VAR:-default} patterns in upstream values
    fn expand_env_vars(&mut self) {
        let Ok(re) = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") else {
            return;
        };

        let upstream = &mut self.upstream;
        for value in [
            &mut upstream.service_name,
            &mut upstream.api_key,
            &mut upstream.api_secret,
            &mut upstream.base_url,
        ] {
            *value = Self::expand_string(&re, value);
        }
    }

    /// Expand environment variables in a string
    fn expand_string(re: &Regex, value: &str) -> String {
        re.replace_all(value, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
    }
}

/// Resolve `env:VAR` references; anything else is taken literally.
fn resolve_value(value: &str, what: &str) -> Result<String> {
    let resolved = match value.strip_prefix("env:") {
        Some(var_name) => env::var(var_name).map_err(|_| {
            Error::Config(format!(
                "Environment variable '{var_name}' not set (required for {what})"
            ))
        })?,
        None => value.to_string(),
    };

    if resolved.trim().is_empty() {
        return Err(Error::Config(format!("No {what} configured")));
    }
    Ok(resolved)
}

/// Human-readable durations ("15s", "500ms", "25m")
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to a millisecond string (e.g., "15000ms")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    /// Deserialize a duration string ("30s", "5m", "100ms") or bare seconds
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the value cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u64),
            Text(String),
        }

        let s = match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => return Ok(Duration::from_secs(secs)),
            Raw::Text(s) => s,
        };
        parse(s.trim()).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(s: &str) -> Result<Duration, String> {
        let invalid = |_| format!("invalid duration '{s}'");
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim().parse::<u64>().map(Duration::from_millis).map_err(invalid)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim().parse::<u64>().map(Duration::from_secs).map_err(invalid)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(invalid)
        } else {
            s.parse::<u64>().map(Duration::from_secs).map_err(invalid)
        }
    }
}
