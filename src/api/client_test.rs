use super::*;
use crate::api::refresh::RefreshError;
use crate::session::MemoryTokenStore;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingRefresher {
    calls: AtomicUsize,
    token: Option<&'static str>,
}

#[async_trait::async_trait]
impl TokenRefresher for CountingRefresher {
    async fn refresh_access_token(&self) -> Result<AccessToken, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.map(AccessToken::new).ok_or(RefreshError::Rejected { status: 401 })
    }
}

fn client_for(server: &MockServer, token: Option<&str>, refreshed: Option<&'static str>) -> (ApiClient, Arc<CountingRefresher>) {
    let store: Arc<dyn TokenStore> = Arc::new(match token {
        Some(t) => MemoryTokenStore::with_token(AccessToken::new(t)),
        None => MemoryTokenStore::new(),
    });
    let refresher = Arc::new(CountingRefresher { calls: AtomicUsize::new(0), token: refreshed });
    let config = StorefrontConfig::new(&server.base_url()).unwrap();
    let client = ApiClient::with_refresher(config, store, refresher.clone()).unwrap();
    (client, refresher)
}

// =============================================================================
// Attempt state machine
// =============================================================================

#[test]
fn attempt_initial_may_refresh() {
    assert_eq!(Attempt::Initial.on_unauthorized(), Some(Attempt::AwaitingRefresh));
}

#[test]
fn attempt_retried_is_terminal() {
    assert_eq!(Attempt::Retried.on_unauthorized(), None);
    assert_eq!(Attempt::AwaitingRefresh.after_refresh(), Attempt::Retried);
}

// =============================================================================
// parse_success_body
// =============================================================================

#[test]
fn empty_success_body_is_null() {
    assert_eq!(parse_success_body(204, b""), ApiOutcome::Success(Value::Null));
    assert_eq!(parse_success_body(200, b"  \n"), ApiOutcome::Success(Value::Null));
}

#[test]
fn malformed_success_body_is_request_error() {
    let outcome = parse_success_body(200, b"{not json");
    assert!(matches!(outcome, ApiOutcome::RequestError { status: 200, ref message } if message.contains("malformed")));
}

// =============================================================================
// send
// =============================================================================

#[tokio::test]
async fn send_attaches_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/me").header("authorization", "Bearer t1");
            then.status(200).json_body(serde_json::json!({ "status": "success", "data": { "name": "Ana" } }));
        })
        .await;

    let (client, refresher) = client_for(&server, Some("t1"), None);
    let outcome = client.send(&RequestDescriptor::get("/auth/me")).await;

    assert!(outcome.is_success());
    mock.assert_async().await;
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn send_without_token_omits_authorization() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/products").header_missing("authorization");
            then.status(200).json_body(serde_json::json!({ "status": "success", "data": { "products": [] } }));
        })
        .await;

    let (client, _) = client_for(&server, None, None);
    assert!(client.send(&RequestDescriptor::get("/products")).await.is_success());
    mock.assert_async().await;
}

#[tokio::test]
async fn persistent_401_after_retry_is_final() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/orders");
            then.status(401).json_body(serde_json::json!({ "message": "jwt expired" }));
        })
        .await;

    let (client, refresher) = client_for(&server, Some("old"), Some("new"));
    let outcome = client.send(&RequestDescriptor::get("/orders")).await;

    assert_eq!(outcome, ApiOutcome::RequestError { status: 401, message: "jwt expired".into() });
    assert_eq!(mock.hits_async().await, 2);
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn without_refresh_reports_401_directly() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(401).json_body(serde_json::json!({ "message": "Invalid email or password" }));
        })
        .await;

    let (client, refresher) = client_for(&server, None, Some("new"));
    let outcome = client.login("ana@example.test", "wrong").await;

    assert_eq!(outcome, ApiOutcome::RequestError { status: 401, message: "Invalid email or password".into() });
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    assert!(client.store().get().is_none());
}

#[tokio::test]
async fn transport_failure_reports_no_response_status() {
    let config = StorefrontConfig::new("http://127.0.0.1:9").unwrap();
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let refresher = Arc::new(CountingRefresher { calls: AtomicUsize::new(0), token: None });
    let client = ApiClient::with_refresher(config, store, refresher).unwrap();

    let outcome = client.send(&RequestDescriptor::get("/products")).await;
    assert!(matches!(outcome, ApiOutcome::RequestError { status: NO_RESPONSE_STATUS, .. }));
}

// =============================================================================
// call
// =============================================================================

#[tokio::test]
async fn call_invokes_handler_only_on_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/products/missing");
            then.status(404).json_body(serde_json::json!({ "message": "Product not found" }));
        })
        .await;

    let (client, _) = client_for(&server, None, None);
    let mut seen = None;
    let body = client.call(&RequestDescriptor::get("/products/missing"), |e| seen = Some(e.clone())).await;

    assert!(body.is_none());
    let seen = seen.unwrap();
    assert_eq!(seen.status, 404);
    assert_eq!(seen.message, "Product not found");
}

// =============================================================================
// login / logout
// =============================================================================

#[tokio::test]
async fn login_stores_access_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(serde_json::json!({ "email": "ana@example.test", "password": "hunter2" }));
            then.status(200).json_body(serde_json::json!({ "status": "success", "data": { "accessToken": "t-login" } }));
        })
        .await;

    let (client, _) = client_for(&server, None, None);
    assert!(client.login("ana@example.test", "hunter2").await.is_success());
    assert_eq!(client.store().get().unwrap().as_str(), "t-login");
}

#[tokio::test]
async fn register_posts_fields_without_storing_a_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/register").json_body(serde_json::json!({
                "name": "Ana", "email": "ana@example.test", "password": "hunter2"
            }));
            then.status(201).json_body(serde_json::json!({ "status": "success", "data": { "id": 1 } }));
        })
        .await;

    let (client, _) = client_for(&server, None, None);
    assert!(client.register("Ana", "ana@example.test", "hunter2").await.is_success());
    mock.assert_async().await;
    assert!(client.store().get().is_none());
}

#[tokio::test]
async fn logout_clears_store_even_on_server_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/logout");
            then.status(500);
        })
        .await;

    let (client, _) = client_for(&server, Some("t1"), None);
    let outcome = client.logout().await;

    assert!(!outcome.is_success());
    assert!(client.store().get().is_none());
}
