//! OAuth2 client-credentials token acquisition
//!
//! # Security
//!
//! Token values and the client secret are never logged. The secret only
//! leaves the process in the form-encoded body of the token request.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::credentials::{Credentials, Endpoint, mask};
use super::error_chain;

/// Token endpoint path, relative to the realm base URL
pub const TOKEN_PATH: &str = "/v1/security/oauth2/token";

/// Timeout used when a caller does not pick one
pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Token exchange failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token request never produced a response (DNS, connect, timeout, TLS)
    #[error("token request failed: {0}")]
    Transport(String),

    /// 2xx response without a usable `access_token`
    #[error("no access token in response")]
    MissingToken,

    /// Token endpoint answered with a non-success status
    #[error("token endpoint returned HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Upstream error body (or status reason when empty)
        body: String,
    },
}

/// Short-lived bearer credential for forwarded requests
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// A token together with its advertised lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The token
    pub token: BearerToken,
    /// `expires_in` from the token response, when present
    pub expires_in: Option<Duration>,
}

/// Anything that can hand out bearer tokens for a set of credentials
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a bearer token for `credentials`, bounded by `timeout`
    async fn get_token(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<BearerToken, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// HTTP client-credentials token provider
pub struct TokenProvider {
    client: Client,
    endpoint: Endpoint,
    cache: Option<TokenCache>,
}

impl TokenProvider {
    /// Create a provider that fetches a fresh token on every call
    #[must_use]
    pub fn new(client: Client, endpoint: Endpoint) -> Self {
        Self {
            client,
            endpoint,
            cache: None,
        }
    }

    /// Reuse tokens until shortly before they expire
    #[must_use]
    pub fn with_cache(mut self, cache: TokenCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Whether tokens are cached between calls
    #[must_use]
    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Perform one client-credentials exchange, bypassing any cache.
    pub async fn fetch_token(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<IssuedToken, AuthError> {
        let url = self.endpoint.url(credentials, TOKEN_PATH);
        debug!(
            service = credentials.service_name(),
            client_id = %mask(credentials.api_key()),
            "Requesting access token"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.api_key()),
            ("client_secret", credentials.api_secret()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(service = credentials.service_name(), error = %e, "Token request failed");
                AuthError::Transport(error_chain(&e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(error_chain(&e)))?;

        if !status.is_success() {
            warn!(
                service = credentials.service_name(),
                status = status.as_u16(),
                "Token endpoint rejected credentials"
            );
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: error_body(status, &body),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|_| AuthError::MissingToken)?;
        let access_token = parsed
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::MissingToken)?;

        Ok(IssuedToken {
            token: BearerToken::new(access_token),
            expires_in: parsed.expires_in.map(Duration::from_secs),
        })
    }
}

#[async_trait]
impl TokenSource for TokenProvider {
    async fn get_token(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<BearerToken, AuthError> {
        match &self.cache {
            Some(cache) => {
                cache
                    .get_or_fetch(credentials, || self.fetch_token(credentials, timeout))
                    .await
            }
            None => self
                .fetch_token(credentials, timeout)
                .await
                .map(|issued| issued.token),
        }
    }
}

/// Stringify an error body: JSON is compacted, empty bodies fall back to the
/// status line.
fn error_body(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status.to_string();
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json.to_string(),
        Err(_) => body.to_string(),
    }
}

// ============================================================================
// Token cache
// ============================================================================

type CacheKey = (String, String);

#[derive(Clone)]
struct CachedToken {
    token: BearerToken,
    expires_at: Instant,
}

/// Per-credential token cache with single-flight refresh.
///
/// Each `(service_name, api_key)` pair owns an async mutex; callers that find
/// the entry stale wait on the same lock, so only one refresh is in flight.
pub struct TokenCache {
    entries: DashMap<CacheKey, Arc<Mutex<Option<CachedToken>>>>,
    max_ttl: Duration,
    refresh_margin: Duration,
}

impl TokenCache {
    /// Tokens live for `min(expires_in - refresh_margin, max_ttl)`
    #[must_use]
    pub fn new(max_ttl: Duration, refresh_margin: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_ttl,
            refresh_margin,
        }
    }

    /// Return a live cached token or run `fetch` and remember its result
    pub async fn get_or_fetch<F, Fut>(
        &self,
        credentials: &Credentials,
        fetch: F,
    ) -> Result<BearerToken, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IssuedToken, AuthError>>,
    {
        let key = (
            credentials.service_name().to_string(),
            credentials.api_key().to_string(),
        );
        let slot = Arc::clone(
            self.entries
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .value(),
        );

        let mut guard = slot.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                debug!(service = credentials.service_name(), "Token cache hit");
                return Ok(cached.token.clone());
            }
        }

        let issued = fetch().await?;
        let ttl = self.lifetime(issued.expires_in);
        *guard = (!ttl.is_zero()).then(|| CachedToken {
            token: issued.token.clone(),
            expires_at: Instant::now() + ttl,
        });

        Ok(issued.token)
    }

    fn lifetime(&self, expires_in: Option<Duration>) -> Duration {
        expires_in.map_or(self.max_ttl, |lifetime| {
            lifetime.saturating_sub(self.refresh_margin).min(self.max_ttl)
        })
    }

    /// Drop every cached token
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn creds() -> Credentials {
        Credentials::new("test", "key", "secret").unwrap()
    }

    #[test]
    fn bearer_token_debug_is_masked() {
        let token = BearerToken::new("abc");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
        assert_eq!(token.authorization(), "Bearer abc");
    }

    #[test]
    fn error_body_prefers_json_then_text_then_status() {
        assert_eq!(
            error_body(StatusCode::UNAUTHORIZED, r#"{ "error": "invalid_client" }"#),
            r#"{"error":"invalid_client"}"#
        );
        assert_eq!(error_body(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_body(StatusCode::UNAUTHORIZED, ""), "401 Unauthorized");
    }

    #[test]
    fn lifetime_respects_margin_and_ceiling() {
        let cache = TokenCache::new(Duration::from_secs(600), Duration::from_secs(60));
        assert_eq!(cache.lifetime(Some(Duration::from_secs(1799))), Duration::from_secs(600));
        assert_eq!(cache.lifetime(Some(Duration::from_secs(120))), Duration::from_secs(60));
        assert_eq!(cache.lifetime(Some(Duration::from_secs(30))), Duration::ZERO);
        assert_eq!(cache.lifetime(None), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn cache_reuses_live_token() {
        let cache = TokenCache::new(Duration::from_secs(600), Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(IssuedToken {
                token: BearerToken::new("t1"),
                expires_in: Some(Duration::from_secs(1799)),
            })
        };

        let first = cache.get_or_fetch(&creds(), fetch).await.unwrap();
        let second = cache.get_or_fetch(&creds(), fetch).await.unwrap();
        assert_eq!(first.value(), "t1");
        assert_eq!(second.value(), "t1");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_does_not_store_failures_or_short_lived_tokens() {
        let cache = TokenCache::new(Duration::from_secs(600), Duration::from_secs(60));
        let failed = cache
            .get_or_fetch(&creds(), || async { Err(AuthError::MissingToken) })
            .await;
        assert_eq!(failed.unwrap_err(), AuthError::MissingToken);

        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let short = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(IssuedToken {
                token: BearerToken::new("short"),
                expires_in: Some(Duration::from_secs(10)),
            })
        };
        cache.get_or_fetch(&creds(), short).await.unwrap();
        cache.get_or_fetch(&creds(), short).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_is_keyed_by_service_and_key() {
        let cache = TokenCache::new(Duration::from_secs(600), Duration::from_secs(60));
        let other = Credentials::new("production", "key", "secret").unwrap();
        let issue = |value: &'static str| {
            move || async move {
                Ok(IssuedToken {
                    token: BearerToken::new(value),
                    expires_in: None,
                })
            }
        };

        cache.get_or_fetch(&creds(), issue("a")).await.unwrap();
        let token = cache.get_or_fetch(&other, issue("b")).await.unwrap();
        assert_eq!(token.value(), "b");

        cache.clear();
        let token = cache.get_or_fetch(&creds(), issue("c")).await.unwrap();
        assert_eq!(token.value(), "c");
    }
}
