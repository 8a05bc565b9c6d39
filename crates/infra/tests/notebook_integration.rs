//! Integration tests for the notebook-side client
//!
//! Runs a real listener against a mock identity provider and polls it the
//! way a notebook kernel does.

use std::time::Duration;

use odm_auth_common::auth::{TokenEvent, TokenResponse};
use odm_auth_common::testing::fixtures::{token_response_json, token_set, unsigned_jwt};
use odm_auth_domain::{Config, ListenerSettings, OdmAuthError};
use chrono::Utc;
use odm_auth_infra::{
    connect, CallbackServer, InputStore, InputsRecord, NotebookAuth, NotebookClient, TokenStatus,
};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL: Duration = Duration::from_millis(20);

fn store(dir: &TempDir) -> InputStore {
    InputStore::new(Some(dir.path().join("inputs.json")), InputsRecord::default())
}

fn notebook(inputs: InputStore, prefix: &str) -> NotebookClient {
    NotebookClient::new(ListenerSettings::default(), inputs, prefix)
        .expect("Failed to build notebook client")
        .with_poll_interval(POLL)
}

fn browser_token(id_token: Option<String>) -> TokenResponse {
    TokenResponse {
        access_token: "browser-access".into(),
        refresh_token: None,
        id_token,
        token_type: "Bearer".into(),
        expires_in: 3600,
        scope: None,
    }
}

fn expired_browser_token() -> TokenResponse {
    TokenResponse { expires_in: 0, ..browser_token(None) }
}

/// Listener stand-in that serves `access_token` on `/tokens`.
async fn listener_serving(access_token: &str) -> MockServer {
    let listener = MockServer::start().await;
    let status = TokenStatus::from_tokens(&token_set(access_token, None, 3600), Utc::now(), 0);
    Mock::given(method("GET"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&status))
        .mount(&listener)
        .await;
    listener
}

/// Validates the whole path from browser login to an authorized API call.
///
/// # Test Steps
/// 1. Start a listener on an ephemeral port backed by a mock provider
/// 2. Browser follows `/redirect` and returns on `/callback`
/// 3. Notebook finds the listener through the inputs record and gets the token
/// 4. API request carries `Authorization: Bearer <token>`
#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_notebook_picks_up_token() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=live-code"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response_json("at-live", Some("rt-live"))),
        )
        .expect(1)
        .mount(&provider)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::new(provider.uri(), "notebook-client", "https://odm.example.org/api");
    config.exchange.backoff_ms = 0;
    let inputs = store(&dir);

    let service = connect(&config).expect("Failed to build service");
    let server = CallbackServer::start(service, config.listener.clone(), inputs.clone())
        .await
        .expect("Failed to start listener");
    assert_eq!(inputs.read().await.port, Some(server.port()));

    let browser = reqwest::Client::builder().redirect(Policy::none()).build().expect("client");
    let res = browser
        .get(format!("{}/redirect?path=nowhere&projects=3", server.local_url()))
        .send()
        .await
        .expect("Failed to call /redirect");
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let authorize = url::Url::parse(
        res.headers()["location"].to_str().expect("Location is ASCII"),
    )
    .expect("Failed to parse authorization URL");
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state present");

    let mut callback = url::Url::parse(&format!("{}/callback", server.local_url())).expect("url");
    callback.query_pairs_mut().append_pair("code", "live-code").append_pair("state", &state);
    let res = browser.get(callback).send().await.expect("Failed to call /callback");
    assert_eq!(res.status(), StatusCode::OK);

    let client = notebook(inputs.clone(), "Bearer");
    let status = match client.wait_for_token(Duration::from_secs(2)).await {
        NotebookAuth::Authenticated(status) => status,
        other => panic!("expected a token, got {other:?}"),
    };
    assert_eq!(status.access_token, "at-live");
    assert_eq!(inputs.read().await.projects, vec![3]);

    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/"))
        .and(header("authorization", "Bearer at-live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&api)
        .await;

    let request = client
        .authorize(reqwest::Client::new().get(format!("{}/api/projects/", api.uri())))
        .await
        .expect("Failed to authorize request");
    let res = request.send().await.expect("Failed to call API");
    assert_eq!(res.status(), StatusCode::OK);

    server.shutdown().await.expect("Failed to stop listener");
}

/// Validates an out-of-range token lifetime from the provider ends the login
/// with an error page instead of a dropped connection.
///
/// # Test Steps
/// 1. Provider answers the code grant with an `expires_in` no date can hold
/// 2. Browser completes `/callback` against a live listener
/// 3. Listener answers 502 and keeps the tokens it already held
#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_token_lifetime_is_bad_gateway() {
    let provider = MockServer::start().await;
    let mut body = token_response_json("at-huge", Some("rt-huge"));
    body["expires_in"] = json!(100_000_000_000_000_i64);
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&provider)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::new(provider.uri(), "notebook-client", "https://odm.example.org/api");
    config.exchange.backoff_ms = 0;
    let service = connect(&config).expect("Failed to build service");
    service.session().store_tokens(token_set("existing", Some("rt"), 3600));
    let server = CallbackServer::start(service.clone(), config.listener.clone(), store(&dir))
        .await
        .expect("Failed to start listener");

    let browser = reqwest::Client::builder().redirect(Policy::none()).build().expect("client");
    let res = browser
        .get(format!("{}/redirect?path=nowhere", server.local_url()))
        .send()
        .await
        .expect("Failed to call /redirect");
    let authorize = url::Url::parse(res.headers()["location"].to_str().expect("ASCII"))
        .expect("Failed to parse authorization URL");
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state present");

    let mut callback = url::Url::parse(&format!("{}/callback", server.local_url())).expect("url");
    callback.query_pairs_mut().append_pair("code", "abc").append_pair("state", &state);
    let res = browser.get(callback).send().await.expect("Listener should answer");

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.text().await.expect("body").contains("<html"));
    assert_eq!(service.session().tokens().expect("tokens kept").access_token, "existing");

    server.shutdown().await.expect("Failed to stop listener");
}

#[tokio::test]
async fn test_no_listener_recorded_requires_login() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let client = notebook(store(&dir), "Bearer");

    let outcome = client.wait_for_token(Duration::from_millis(100)).await;

    assert_eq!(
        outcome,
        NotebookAuth::AuthRequired {
            login_url: "http://localhost:8888/asdc/redirect?path=nowhere".to_string()
        }
    );
    assert!(client.current_token().is_none());
}

#[tokio::test]
async fn test_listener_without_token_requires_login() {
    let listener = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "auth_required"})))
        .mount(&listener)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let inputs = store(&dir);
    inputs.write_port(listener.address().port()).await.expect("Failed to record port");
    let client = notebook(inputs, "Bearer");

    let outcome = client.wait_for_token(Duration::from_millis(200)).await;

    assert!(matches!(outcome, NotebookAuth::AuthRequired { .. }));
    let polls = listener.received_requests().await.expect("recording enabled").len();
    assert!(polls >= 2, "expected repeated polling, saw {polls}");
}

#[tokio::test]
async fn test_authorize_without_token_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let client = notebook(store(&dir), "Bearer");

    let err = client
        .authorize(reqwest::Client::new().get("http://127.0.0.1:1/"))
        .await
        .expect_err("no token yet");
    assert!(matches!(err, OdmAuthError::Auth(_)));
}

#[tokio::test]
async fn test_fresh_browser_token_checks_nonce() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let client = notebook(store(&dir), "JWT");
    let id_token = unsigned_jwt(&json!({"sub": "auth0|1", "nonce": "expected-nonce"}));

    let err = client
        .adopt_browser_token(
            browser_token(Some(id_token.clone())),
            TokenEvent::Fresh { nonce: "other-nonce".into() },
        )
        .expect_err("nonce mismatch");
    assert!(matches!(err, OdmAuthError::Security(_)));
    assert!(client.current_token().is_none());

    let err = client
        .adopt_browser_token(browser_token(None), TokenEvent::Fresh { nonce: "n".into() })
        .expect_err("no ID token to check");
    assert!(matches!(err, OdmAuthError::Security(_)));

    let status = client
        .adopt_browser_token(
            browser_token(Some(id_token)),
            TokenEvent::Fresh { nonce: "expected-nonce".into() },
        )
        .expect("matching nonce accepted");
    assert_eq!(status.claim("sub"), Some("auth0|1"));

    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "JWT browser-access"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api)
        .await;
    let res = client
        .authorize(reqwest::Client::new().get(api.uri()))
        .await
        .expect("token held")
        .send()
        .await
        .expect("Failed to call API");
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_reused_browser_token_skips_nonce() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let client = notebook(store(&dir), "Bearer");

    let status = client
        .adopt_browser_token(browser_token(None), TokenEvent::Reused)
        .expect("reused tokens are not nonce-checked");

    assert_eq!(status.access_token, "browser-access");
    assert_eq!(client.current_token().map(|t| t.access_token), Some("browser-access".into()));
}

/// Validates an expired held token is replaced from the listener before use.
///
/// # Test Steps
/// 1. Adopt a browser token that is already expired
/// 2. Listener serves a fresh token on `/tokens`
/// 3. `authorize` sends the fresh token, a second call reuses it
#[tokio::test]
async fn test_expired_token_is_fetched_again() {
    let listener = listener_serving("at-refreshed").await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let inputs = store(&dir);
    inputs.write_port(listener.address().port()).await.expect("Failed to record port");
    let client = notebook(inputs, "Bearer");
    client
        .adopt_browser_token(expired_browser_token(), TokenEvent::Reused)
        .expect("Failed to adopt token");

    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer at-refreshed"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&api)
        .await;

    for _ in 0..2 {
        let res = client
            .authorize(reqwest::Client::new().get(api.uri()))
            .await
            .expect("Failed to authorize request")
            .send()
            .await
            .expect("Failed to call API");
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let fetches = listener.received_requests().await.expect("recording enabled").len();
    assert_eq!(fetches, 1);
    assert_eq!(client.current_token().map(|t| t.access_token), Some("at-refreshed".into()));
}

#[tokio::test]
async fn test_unreachable_listener_keeps_expired_token() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let inputs = store(&dir);
    inputs.write_port(1).await.expect("Failed to record port");
    let client = notebook(inputs, "Bearer");
    client
        .adopt_browser_token(expired_browser_token(), TokenEvent::Reused)
        .expect("Failed to adopt token");

    let token = client.token().await.expect("expired token still usable");

    assert_eq!(token.access_token, "browser-access");
    assert!(token.expired);
}

#[tokio::test]
async fn test_expired_token_without_listener_requires_login() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let client = notebook(store(&dir), "Bearer");
    client
        .adopt_browser_token(expired_browser_token(), TokenEvent::Reused)
        .expect("Failed to adopt token");

    let err = client.token().await.expect_err("no listener to refresh from");
    assert!(matches!(err, OdmAuthError::Auth(_)));
}
