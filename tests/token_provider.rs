//! Token acquisition against a mock token endpoint

use std::time::Duration;

use amadeus_mcp_gateway::upstream::{
    AuthError, Credentials, Endpoint, TOKEN_PATH, TokenCache, TokenProvider, TokenSource,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn creds() -> Credentials {
    Credentials::new("test", "key", "secret").unwrap()
}

fn provider(server: &MockServer) -> TokenProvider {
    TokenProvider::new(reqwest::Client::new(), Endpoint::new(server.uri()).unwrap())
}

#[tokio::test]
async fn token_is_read_from_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=key"))
        .and(body_string_contains("client_secret=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "amadeusOAuth2Token",
            "access_token": "abc",
            "token_type": "Bearer",
            "expires_in": 1799
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = provider(&server).get_token(&creds(), TIMEOUT).await.unwrap();
    assert_eq!(token.value(), "abc");
    assert_eq!(token.authorization(), "Bearer abc");
}

#[tokio::test]
async fn fetch_reports_lifetime() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "abc", "expires_in": 1799})),
        )
        .mount(&server)
        .await;

    let issued = provider(&server).fetch_token(&creds(), TIMEOUT).await.unwrap();
    assert_eq!(issued.expires_in, Some(Duration::from_secs(1799)));
}

#[tokio::test]
async fn missing_token_field_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
        .mount(&server)
        .await;

    let err = provider(&server).get_token(&creds(), TIMEOUT).await.unwrap_err();
    assert_eq!(err, AuthError::MissingToken);
    assert_eq!(err.to_string(), "no access token in response");
}

#[tokio::test]
async fn unparsable_success_body_is_missing_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = provider(&server).get_token(&creds(), TIMEOUT).await.unwrap_err();
    assert_eq!(err, AuthError::MissingToken);
}

#[tokio::test]
async fn rejected_credentials_carry_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Client credentials are invalid",
            "code": 38187
        })))
        .mount(&server)
        .await;

    let err = provider(&server).get_token(&creds(), TIMEOUT).await.unwrap_err();
    let AuthError::Rejected { status, body } = err else {
        panic!("expected rejection, got {err:?}");
    };
    assert_eq!(status, 401);
    assert!(body.contains("invalid_client"));
    assert!(body.contains("Client credentials are invalid"));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = provider(&server).get_token(&creds(), TIMEOUT).await.unwrap_err();
    assert_eq!(
        err,
        AuthError::Rejected {
            status: 503,
            body: "503 Service Unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let provider = TokenProvider::new(
        reqwest::Client::new(),
        Endpoint::new("http://127.0.0.1:1").unwrap(),
    );
    let err = provider.get_token(&creds(), TIMEOUT).await.unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .get_token(&creds(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn every_call_fetches_a_fresh_token_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc"})))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    assert!(!provider.is_caching());
    provider.get_token(&creds(), TIMEOUT).await.unwrap();
    provider.get_token(&creds(), TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn cached_provider_reuses_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "abc", "expires_in": 1799})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server).with_cache(TokenCache::new(
        Duration::from_secs(600),
        Duration::from_secs(60),
    ));
    assert!(provider.is_caching());

    let first = provider.get_token(&creds(), TIMEOUT).await.unwrap();
    let second = provider.get_token(&creds(), TIMEOUT).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "abc", "expires_in": 1799}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server).with_cache(TokenCache::new(
        Duration::from_secs(600),
        Duration::from_secs(60),
    ));
    let creds = creds();

    let (a, b, c) = tokio::join!(
        provider.get_token(&creds, TIMEOUT),
        provider.get_token(&creds, TIMEOUT),
        provider.get_token(&creds, TIMEOUT),
    );
    assert_eq!(a.unwrap().value(), "abc");
    assert_eq!(b.unwrap().value(), "abc");
    assert_eq!(c.unwrap().value(), "abc");
}
