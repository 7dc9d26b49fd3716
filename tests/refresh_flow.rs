//! Refresh and retry behavior against a mock commerce API.

use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use storefront::api::{AUTH_REFRESH_FAILED_MESSAGE, ApiClient, ApiErrorKind, ApiOutcome, RequestDescriptor};
use storefront::config::StorefrontConfig;
use storefront::session::{AccessToken, MemoryTokenStore, TokenStore};

fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
    let store: Arc<dyn TokenStore> = Arc::new(match token {
        Some(t) => MemoryTokenStore::with_token(AccessToken::new(t)),
        None => MemoryTokenStore::new(),
    });
    ApiClient::new(StorefrontConfig::new(&server.base_url()).unwrap(), store).unwrap()
}

fn refreshed(token: &str) -> serde_json::Value {
    json!({ "status": "success", "data": { "accessToken": token } })
}

#[tokio::test]
async fn expired_token_is_refreshed_once_and_request_retried_once() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(GET).path("/orders").header("authorization", "Bearer old");
            then.status(401).json_body(json!({ "message": "jwt expired" }));
        })
        .await;
    let accepted = server
        .mock_async(|when, then| {
            when.method(GET).path("/orders").header("authorization", "Bearer new");
            then.status(200).json_body(json!({ "status": "success", "data": [] }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(200).json_body(refreshed("new"));
        })
        .await;

    let api = client(&server, Some("old"));
    let outcome = api.send(&RequestDescriptor::get("/orders")).await;

    assert!(outcome.is_success());
    assert_eq!(rejected.hits_async().await, 1);
    assert_eq!(accepted.hits_async().await, 1);
    assert_eq!(refresh.hits_async().await, 1);
    assert_eq!(api.store().get().unwrap().as_str(), "new");
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    const CALLERS: usize = 8;

    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(GET).path("/cart").header("authorization", "Bearer old");
            then.status(401);
        })
        .await;
    let accepted = server
        .mock_async(|when, then| {
            when.method(GET).path("/cart").header("authorization", "Bearer new");
            then.status(200).json_body(json!({ "status": "success", "data": { "items": [] } }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(200).delay(Duration::from_millis(200)).json_body(refreshed("new"));
        })
        .await;

    let api = client(&server, Some("old"));
    let request = RequestDescriptor::get("/cart");
    let outcomes = futures::future::join_all((0..CALLERS).map(|_| api.send(&request))).await;

    assert!(outcomes.iter().all(ApiOutcome::is_success));
    assert_eq!(refresh.hits_async().await, 1);
    assert_eq!(api.refresh_count(), 1);
    assert_eq!(rejected.hits_async().await, CALLERS);
    assert_eq!(accepted.hits_async().await, CALLERS);
}

#[tokio::test]
async fn failed_refresh_clears_session_and_reports_fixed_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/me");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(401).json_body(json!({ "message": "refresh token expired" }));
        })
        .await;

    let api = client(&server, Some("old"));
    let mut seen = None;
    let body = api.call(&RequestDescriptor::get("/auth/me"), |e| seen = Some(e.clone())).await;

    assert!(body.is_none());
    let error = seen.unwrap();
    assert_eq!(error.kind, ApiErrorKind::AuthUnrecoverable);
    assert_eq!(error.message, AUTH_REFRESH_FAILED_MESSAGE);
    assert_eq!(error.message, "Unable to refresh access token");
    assert!(api.store().get().is_none());
}

#[tokio::test]
async fn later_request_refreshes_again_after_failed_refresh() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(GET).path("/cart");
            then.status(401);
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token");
            then.status(503);
        })
        .await;

    let api = client(&server, None);
    assert!(matches!(api.send(&RequestDescriptor::get("/cart")).await, ApiOutcome::AuthFailure { .. }));
    assert!(matches!(api.send(&RequestDescriptor::get("/cart")).await, ApiOutcome::AuthFailure { .. }));

    assert_eq!(rejected.hits_async().await, 2);
    assert_eq!(refresh.hits_async().await, 2);
    assert_eq!(api.refresh_count(), 2);
}

#[tokio::test]
async fn refresh_rides_on_cookie_set_at_login() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200)
                .header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
                .json_body(refreshed("first"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/me").header("authorization", "Bearer first");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/auth/me").header("authorization", "Bearer second");
            then.status(200).json_body(json!({ "status": "success", "data": { "id": 1, "name": "Ana", "email": "a@x" } }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/refresh-token").header("cookie", "refreshToken=r1");
            then.status(200).json_body(refreshed("second"));
        })
        .await;

    let api = client(&server, None);
    assert!(api.login("ana@example.test", "hunter2").await.is_success());
    assert!(api.send(&RequestDescriptor::get("/auth/me")).await.is_success());

    refresh.assert_async().await;
    assert_eq!(api.store().get().unwrap().as_str(), "second");
}
