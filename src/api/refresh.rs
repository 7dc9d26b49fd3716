//! Single-flight access-token refresh.
//!
//! DESIGN
//! ======
//! Any number of requests can hit a 401 in the same window. The first one to
//! ask starts the refresh; every later caller clones the same shared future
//! and observes the same outcome. The shared future commits its result to the
//! token store before resolving, so no waiter can retry with a stale token.
//!
//! A caller that reports the 401 after the refresh already finished passes
//! its stale token in: if the store now holds something newer, that token is
//! returned without another network call.
//!
//! Every settled flight closes a [`RefreshWindow`]. A failure is remembered
//! against the stale token and the window it closed; a caller whose request
//! went out inside that window drains the failure instead of refreshing
//! again. A request sent after the failure settled starts a new cycle.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Deserialize;

use super::types::decode_data;
use crate::session::{AccessToken, TokenStore};

// =============================================================================
// ERROR
// =============================================================================

/// Why a refresh did not produce a new access token. `Clone` so every
/// single-flight waiter receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The server refused the refresh credential.
    #[error("refresh rejected: status {status}")]
    Rejected { status: u16 },

    /// The refresh request did not complete.
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// The refresh response did not contain an access token.
    #[error("refresh response malformed: {0}")]
    Malformed(String),
}

// =============================================================================
// REFRESHER
// =============================================================================

/// Exchanges the long-lived refresh credential for a new access token.
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(&self) -> Result<AccessToken, RefreshError>;
}

#[derive(Deserialize)]
struct RefreshData {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Calls the API refresh endpoint. The refresh cookie travels in the cookie
/// jar of the shared `reqwest::Client`.
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTokenRefresher {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: String) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait::async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh_access_token(&self) -> Result<AccessToken, RefreshError> {
        let response = self
            .http
            .post(&self.endpoint)
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected { status: status.as_u16() });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;
        let data: RefreshData = decode_data(body).map_err(|e| RefreshError::Malformed(e.message))?;
        if data.access_token.is_empty() {
            return Err(RefreshError::Malformed("empty access token".into()));
        }
        Ok(AccessToken::new(data.access_token))
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

type RefreshFlight = Shared<BoxFuture<'static, Result<AccessToken, RefreshError>>>;

/// Number of refresh flights settled when a request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshWindow(u64);

enum RefreshState {
    Idle,
    InFlight(RefreshFlight),
    /// Refresh failed for requests holding `stale` that were sent in `window`.
    Failed { stale: Option<AccessToken>, window: RefreshWindow, error: RefreshError },
}

pub struct RefreshCoordinator {
    refresher: Arc<dyn TokenRefresher>,
    store: Arc<dyn TokenStore>,
    state: Arc<Mutex<RefreshState>>,
    settled: Arc<AtomicU64>,
    issued: AtomicUsize,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(refresher: Arc<dyn TokenRefresher>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            refresher,
            store,
            state: Arc::new(Mutex::new(RefreshState::Idle)),
            settled: Arc::new(AtomicU64::new(0)),
            issued: AtomicUsize::new(0),
        }
    }

    /// The window a request sent now belongs to.
    #[must_use]
    pub fn window(&self) -> RefreshWindow {
        RefreshWindow(self.settled.load(Ordering::SeqCst))
    }

    /// Obtain a token newer than `stale` for a new request cycle.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure; the token store is empty afterward.
    pub async fn refresh(&self, stale: Option<&AccessToken>) -> Result<AccessToken, RefreshError> {
        self.refresh_in(stale, None).await
    }

    /// Obtain a token newer than `stale` for a request sent in `sent_in`.
    ///
    /// A request from the window whose refresh already failed receives that
    /// failure without another network call.
    ///
    /// # Errors
    ///
    /// Returns the shared refresh failure; the token store is empty afterward.
    pub async fn refresh_after(
        &self,
        stale: Option<&AccessToken>,
        sent_in: RefreshWindow,
    ) -> Result<AccessToken, RefreshError> {
        self.refresh_in(stale, Some(sent_in)).await
    }

    async fn refresh_in(
        &self,
        stale: Option<&AccessToken>,
        sent_in: Option<RefreshWindow>,
    ) -> Result<AccessToken, RefreshError> {
        let flight = {
            let mut state = self.lock_state();
            match &*state {
                RefreshState::InFlight(flight) => {
                    tracing::debug!("joining in-flight token refresh");
                    flight.clone()
                }
                RefreshState::Idle | RefreshState::Failed { .. } => {
                    if let Some(current) = self.store.get() {
                        if Some(&current) != stale {
                            tracing::debug!("token already refreshed in this window");
                            return Ok(current);
                        }
                    }
                    if let RefreshState::Failed { stale: failed_for, window, error } = &*state {
                        if failed_for.as_ref() == stale && sent_in.is_some_and(|sent| sent <= *window) {
                            tracing::debug!("draining failed token refresh");
                            return Err(error.clone());
                        }
                    }
                    let flight = self.start(stale.cloned());
                    *state = RefreshState::InFlight(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Number of refresh calls issued to the refresher so far.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    fn start(&self, stale: Option<AccessToken>) -> RefreshFlight {
        self.issued.fetch_add(1, Ordering::SeqCst);
        tracing::info!("refreshing access token");

        let refresher = Arc::clone(&self.refresher);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let settled = Arc::clone(&self.settled);

        async move {
            let outcome = refresher.refresh_access_token().await;
            match &outcome {
                Ok(token) => {
                    store.set(token.clone());
                    tracing::info!("access token refreshed");
                }
                Err(e) => {
                    store.clear();
                    tracing::warn!(error = %e, "access token refresh failed; session cleared");
                }
            }

            let mut state = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let window = RefreshWindow(settled.fetch_add(1, Ordering::SeqCst));
            *state = match &outcome {
                Ok(_) => RefreshState::Idle,
                Err(e) => RefreshState::Failed { stale, window, error: e.clone() },
            };
            drop(state);
            outcome
        }
        .boxed()
        .shared()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
