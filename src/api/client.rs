//! Authenticated request client.
//!
//! ARCHITECTURE
//! ============
//! Every loader and action talks to the commerce API through [`ApiClient`].
//! One call walks a small state machine:
//!
//! ```text
//! Initial --401--> AwaitingRefresh --refreshed--> Retried (terminal)
//!                        |
//!                        +--refresh failed--> AuthFailure
//! ```
//!
//! The retried response is final whatever its status, so a credential that
//! keeps failing can never loop. Non-success outcomes are returned as data
//! ([`ApiOutcome`]); [`ApiClient::call`] layers the handler-style contract
//! on top for callers that want a callback plus `Option`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use super::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use super::types::{
    ApiError, ApiOutcome, AuthFailureReason, NO_RESPONSE_STATUS, RequestDescriptor, decode_data,
    error_message_from_body,
};
use crate::config::{ConfigError, HttpTimeouts, StorefrontConfig};
use crate::session::{AccessToken, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    AwaitingRefresh,
    Retried,
}

impl Attempt {
    /// Only the first response may start a refresh.
    fn on_unauthorized(self) -> Option<Self> {
        match self {
            Self::Initial => Some(Self::AwaitingRefresh),
            Self::AwaitingRefresh | Self::Retried => None,
        }
    }

    fn after_refresh(self) -> Self {
        match self {
            Self::Initial | Self::AwaitingRefresh | Self::Retried => Self::Retried,
        }
    }
}

#[derive(Deserialize)]
struct LoginData {
    #[serde(rename = "accessToken")]
    access_token: String,
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: StorefrontConfig,
    store: Arc<dyn TokenStore>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Build a client that refreshes through the configured refresh endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig, store: Arc<dyn TokenStore>) -> Result<Self, ConfigError> {
        let http = build_http(config.timeouts)?;
        let refresher = Arc::new(HttpTokenRefresher::new(http.clone(), config.refresh_endpoint()));
        Ok(Self::from_parts(http, config, store, refresher))
    }

    /// Build a client with a caller-supplied refresher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_refresher(
        config: StorefrontConfig,
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self, ConfigError> {
        let http = build_http(config.timeouts)?;
        Ok(Self::from_parts(http, config, store, refresher))
    }

    fn from_parts(
        http: reqwest::Client,
        config: StorefrontConfig,
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let refresh = RefreshCoordinator::new(refresher, Arc::clone(&store));
        Self { inner: Arc::new(ClientInner { http, config, store, refresh }) }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Number of refresh calls issued by this client so far.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.inner.refresh.refresh_count()
    }

    /// Perform one logical call, refreshing and retrying at most once.
    pub async fn send(&self, request: &RequestDescriptor) -> ApiOutcome {
        let mut attempt = Attempt::Initial;
        let window = self.inner.refresh.window();
        let mut token = self.inner.store.get();

        loop {
            let response = match self.dispatch(request, token.as_ref()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(path = %request.path(), error = %e, "API request failed without a response");
                    return ApiOutcome::RequestError { status: NO_RESPONSE_STATUS, message: e.to_string() };
                }
            };

            if response.status() == StatusCode::UNAUTHORIZED && request.refresh_on_unauthorized() {
                if let Some(next) = attempt.on_unauthorized() {
                    attempt = next;
                    tracing::debug!(path = %request.path(), ?attempt, "access token rejected");
                    match self.inner.refresh.refresh_after(token.as_ref(), window).await {
                        Ok(fresh) => {
                            token = Some(fresh);
                            attempt = attempt.after_refresh();
                            tracing::debug!(path = %request.path(), ?attempt, "retrying with refreshed token");
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(path = %request.path(), error = %e, "session unrecoverable");
                            return ApiOutcome::AuthFailure { reason: AuthFailureReason::RefreshFailed };
                        }
                    }
                }
            }

            return outcome_from_response(request, response).await;
        }
    }

    /// Handler-style wrapper over [`ApiClient::send`]: the body on success,
    /// otherwise `on_error` is invoked with the normalized error and `None`
    /// tells the caller the failure was already handled.
    pub async fn call<F>(&self, request: &RequestDescriptor, on_error: F) -> Option<Value>
    where
        F: FnOnce(&ApiError),
    {
        match self.send(request).await.into_result() {
            Ok(body) => Some(body),
            Err(e) => {
                on_error(&e);
                None
            }
        }
    }

    /// `POST /auth/login`; stores the returned access token on success.
    pub async fn login(&self, email: &str, password: &str) -> ApiOutcome {
        let request =
            RequestDescriptor::post("/auth/login", json!({ "email": email, "password": password })).without_refresh();
        let outcome = self.send(&request).await;
        let ApiOutcome::Success(body) = &outcome else {
            return outcome;
        };
        match decode_data::<LoginData>(body.clone()) {
            Ok(data) if !data.access_token.is_empty() => {
                self.inner.store.set(AccessToken::new(data.access_token));
                tracing::info!("signed in");
                outcome
            }
            Ok(_) => ApiOutcome::RequestError { status: 502, message: "login response carried no access token".into() },
            Err(e) => ApiOutcome::RequestError { status: e.status, message: e.message },
        }
    }

    /// `POST /auth/register`. Registration does not sign the customer in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiOutcome {
        let request =
            RequestDescriptor::post("/auth/register", json!({ "name": name, "email": email, "password": password }))
                .without_refresh();
        self.send(&request).await
    }

    /// `POST /auth/logout`; the local session is cleared whatever the server says.
    pub async fn logout(&self) -> ApiOutcome {
        let outcome = self.send(&RequestDescriptor::post("/auth/logout", json!({})).without_refresh()).await;
        self.inner.store.clear();
        tracing::info!("signed out");
        outcome
    }

    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.inner.config.endpoint(request.path());
        tracing::debug!(method = ?request.method(), %url, "dispatching API request");

        let mut builder = self.inner.http.request(request.method().into(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(payload) = request.payload() {
            builder = builder.json(payload);
        }
        builder.send().await
    }
}

fn build_http(timeouts: HttpTimeouts) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| ConfigError::HttpClientBuild(e.to_string()))
}

async fn outcome_from_response(request: &RequestDescriptor, response: reqwest::Response) -> ApiOutcome {
    let status = response.status();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return ApiOutcome::RequestError { status: status.as_u16(), message: e.to_string() },
    };

    if status.is_success() {
        return parse_success_body(status.as_u16(), &bytes);
    }

    let message = error_message_from_body(&bytes);
    tracing::warn!(path = %request.path(), status = status.as_u16(), %message, "API request returned an error");
    ApiOutcome::RequestError { status: status.as_u16(), message }
}

fn parse_success_body(status: u16, bytes: &[u8]) -> ApiOutcome {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return ApiOutcome::Success(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(body) => ApiOutcome::Success(body),
        Err(e) => ApiOutcome::RequestError { status, message: format!("malformed response body: {e}") },
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
