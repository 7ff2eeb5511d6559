//! Upstream identity: API credentials and realm host resolution

use std::fmt;

use url::Url;

use crate::{Error, Result};

/// Placeholder replaced by the service name in an endpoint template
pub const SERVICE_PLACEHOLDER: &str = "{service}";

/// Default endpoint template (`test` → `https://test.api.amadeus.com`)
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://{service}.api.amadeus.com";

/// API key / secret pair for one upstream realm.
///
/// Immutable once built; the secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    service_name: String,
    api_key: String,
    api_secret: String,
}

impl Credentials {
    /// Build credentials, rejecting empty values and service names that are
    /// not a single DNS label.
    pub fn new(
        service_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self> {
        let service_name = service_name.into().trim().to_ascii_lowercase();
        let api_key = api_key.into();
        let api_secret = api_secret.into();

        if !is_dns_label(&service_name) {
            return Err(Error::Config(format!(
                "Invalid service name '{service_name}': expected a host label such as 'test'"
            )));
        }
        if api_key.trim().is_empty() {
            return Err(Error::Config("API key is empty".to_string()));
        }
        if api_secret.trim().is_empty() {
            return Err(Error::Config("API secret is empty".to_string()));
        }

        Ok(Self {
            service_name,
            api_key,
            api_secret,
        })
    }

    /// Realm selector (e.g. `test`)
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// OAuth client id
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// OAuth client secret
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("service_name", &self.service_name)
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***")
            .finish()
    }
}

/// Resolves the base URL for a service name.
///
/// A template without [`SERVICE_PLACEHOLDER`] pins every realm to one host,
/// which is how tests point the gateway at a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoint {
    template: String,
}

impl Endpoint {
    /// Create an endpoint from a template such as
    /// `https://{service}.api.amadeus.com`.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into().trim_end_matches('/').to_string();
        let sample = template.replace(SERVICE_PLACEHOLDER, "api");
        let url = Url::parse(&sample)
            .map_err(|e| Error::Config(format!("Invalid upstream base URL '{template}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Config(format!(
                "Upstream base URL must be an http(s) URL with a host: {template}"
            )));
        }
        Ok(Self { template })
    }

    /// Base URL (no trailing slash) for `service_name`.
    #[must_use]
    pub fn base_url(&self, service_name: &str) -> String {
        self.template.replace(SERVICE_PLACEHOLDER, service_name)
    }

    /// Absolute URL for `path` on the realm of `credentials`.
    #[must_use]
    pub fn url(&self, credentials: &Credentials, path: &str) -> String {
        format!("{}{}", self.base_url(credentials.service_name()), path)
    }

    /// Parse the URL for `path` and make sure parsing kept the path as given.
    ///
    /// URL parsing drops tabs and newlines and resolves dot-segments, so a
    /// path that passed the allowlist could otherwise reach a different
    /// resource.
    pub fn resolve(&self, credentials: &Credentials, path: &str) -> Result<Url> {
        let base = self.base_url(credentials.service_name());
        let url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| Error::Validation(format!("invalid upstream path '{path}': {e}")))?;
        let prefix = Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid upstream base URL '{base}': {e}")))?;
        let expected = format!("{}{path}", prefix.path().trim_end_matches('/'));
        if url.path() != expected {
            return Err(Error::Validation(format!(
                "path '{path}' does not survive URL normalization (resolves to '{}')",
                url.path()
            )));
        }
        Ok(url)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
        }
    }
}

fn is_dns_label(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 63
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Show only the first characters of a key in logs.
pub(crate) fn mask(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key_or_secret() {
        assert!(matches!(Credentials::new("test", "", "s"), Err(Error::Config(_))));
        assert!(matches!(Credentials::new("test", "k", "  "), Err(Error::Config(_))));
    }

    #[test]
    fn service_name_must_be_a_host_label() {
        assert!(Credentials::new("test", "k", "s").is_ok());
        assert!(Credentials::new("TEST", "k", "s").is_ok());
        assert!(Credentials::new("evil.com/x", "k", "s").is_err());
        assert!(Credentials::new("", "k", "s").is_err());
        assert!(Credentials::new("-test", "k", "s").is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let creds = Credentials::new("test", "abcdefgh", "topsecret").unwrap();
        let out = format!("{creds:?}");
        assert!(!out.contains("topsecret"));
        assert!(!out.contains("abcdefgh"));
        assert!(out.contains("abcd***"));
    }

    #[test]
    fn default_endpoint_uses_service_subdomain() {
        let creds = Credentials::new("test", "k", "s").unwrap();
        let endpoint = Endpoint::default();
        assert_eq!(
            endpoint.url(&creds, "/v1/security/oauth2/token"),
            "https://test.api.amadeus.com/v1/security/oauth2/token"
        );
    }

    #[test]
    fn fixed_endpoint_ignores_service_name() {
        let creds = Credentials::new("test", "k", "s").unwrap();
        let endpoint = Endpoint::new("http://127.0.0.1:9999/").unwrap();
        assert_eq!(endpoint.url(&creds, "/v1/x"), "http://127.0.0.1:9999/v1/x");
    }

    #[test]
    fn resolve_keeps_well_formed_paths() {
        let creds = Credentials::new("test", "k", "s").unwrap();
        let url = Endpoint::default()
            .resolve(&creds, "/v1/booking/flight-orders/eJzTd9f3NjIJdzYBAAsKAkI%3D")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://test.api.amadeus.com/v1/booking/flight-orders/eJzTd9f3NjIJdzYBAAsKAkI%3D"
        );

        let prefixed = Endpoint::new("http://127.0.0.1:9999/api").unwrap();
        assert_eq!(prefixed.resolve(&creds, "/v1/x").unwrap().path(), "/api/v1/x");
    }

    #[test]
    fn resolve_rejects_paths_rewritten_by_parsing() {
        let creds = Credentials::new("test", "k", "s").unwrap();
        let endpoint = Endpoint::default();
        for path in [
            "/v1/ordering/transfer-orders/.\t./transfers/cancellation",
            "/v1/ordering/transfer-orders/../transfers/cancellation",
            "/v1/booking/flight-orders/%2e%2E",
            "/v1/booking/flight-orders/a\nb",
        ] {
            let err = endpoint.resolve(&creds, path).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{path:?}: {err:?}");
        }
    }

    #[test]
    fn endpoint_rejects_non_http_urls() {
        assert!(Endpoint::new("ftp://{service}.example.com").is_err());
        assert!(Endpoint::new("not a url").is_err());
    }
}
