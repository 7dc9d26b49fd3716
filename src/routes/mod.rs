//! Loader/action contract and the storefront routes.
//!
//! DESIGN
//! ======
//! A route resolves reads through a loader and writes through an action.
//! Both take only route parameters (and form fields for actions) and answer
//! exclusively through their return value:
//!
//! - loader: [`Navigation::Render`] with view data, [`Navigation::Redirect`],
//!   or a [`RouteFailure`] for the generic error view.
//! - action: [`ActionOutcome`]. Actions never fail outward; a handled auth
//!   failure is a redirect to `/login`, anything else is reported through the
//!   [`Notifier`] and leaves the shopper on the current view.
//!
//! Which stage runs when is decided by [`crate::router::Router`].

pub mod cart;
pub mod gate;
pub mod home;
pub mod login;
pub mod logout;
pub mod order_detail;
pub mod orders;
pub mod product_detail;
pub mod products;
pub mod profile;
pub mod register;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::types::NO_RESPONSE_STATUS;
use crate::api::{ApiClient, ApiError, GENERIC_ERROR_MESSAGE, RequestDescriptor, decode_data};
use crate::notify::Notifier;

pub const LOGIN_PATH: &str = "/login";

// =============================================================================
// CONTEXT & INPUTS
// =============================================================================

/// Collaborators shared by every loader and action.
#[derive(Clone)]
pub struct RouteContext {
    pub api: ApiClient,
    pub notifier: Arc<dyn Notifier>,
}

impl RouteContext {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Send `request` and decode the `data` member of a success envelope.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T, ApiError> {
        let body = self.api.send(request).await.into_result()?;
        decode_data(body)
    }
}

/// Path parameters matched from the route pattern plus decoded query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    path: BTreeMap<String, String>,
    query: Vec<(String, String)>,
}

impl RouteParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path.get(name).map(String::as_str)
    }

    /// First value for `name`, if any.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// Submitted form fields. Later duplicates overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The field's value when present and not blank.
    #[must_use]
    pub fn required(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// =============================================================================
// RESULTS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation<T> {
    Render(T),
    Redirect(String),
}

impl<T> Navigation<T> {
    #[must_use]
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect(to.into())
    }
}

impl<T: Serialize> Navigation<T> {
    /// Erase the view type for the router boundary.
    ///
    /// # Errors
    ///
    /// Returns a 500 failure if the view data cannot be serialized.
    pub fn into_json(self) -> Result<Navigation<Value>, RouteFailure> {
        match self {
            Self::Render(view) => serde_json::to_value(view)
                .map(Navigation::Render)
                .map_err(|e| RouteFailure::new(500, format!("failed to encode view: {e}"))),
            Self::Redirect(to) => Ok(Navigation::Redirect(to)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Redirect(String),
    /// Local validation failure; nothing was sent.
    Rejected { error: String },
    /// The failure was reported to the shopper; stay on the current view.
    Handled,
}

/// HTTP-like failure consumed by the generic error view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{status} {status_text}: {message}")]
pub struct RouteFailure {
    pub status: u16,
    pub status_text: String,
    pub message: String,
}

impl RouteFailure {
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Error")
            .to_owned();
        Self { status, status_text, message: message.into() }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(405, "This route does not accept that request")
    }

    /// Map a request error onto the error view. A call that never got a
    /// response becomes 503.
    #[must_use]
    pub fn from_api(error: &ApiError) -> Self {
        match error.status {
            NO_RESPONSE_STATUS => Self::new(503, error.message.clone()),
            status => Self::new(status, error.message.clone()),
        }
    }
}

// =============================================================================
// ROUTE TRAIT
// =============================================================================

/// One entry of the route table. Stages a route does not define answer 405.
#[async_trait]
pub trait Route: Send + Sync {
    async fn load(&self, _ctx: &RouteContext, _params: &RouteParams) -> Result<Navigation<Value>, RouteFailure> {
        Err(RouteFailure::method_not_allowed())
    }

    async fn submit(
        &self,
        _ctx: &RouteContext,
        _params: &RouteParams,
        _form: &FormData,
    ) -> Result<ActionOutcome, RouteFailure> {
        Err(RouteFailure::method_not_allowed())
    }
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Report a failed mutation the same way for every action: unrecoverable
/// sessions go to login, other errors stay on the view with a notice.
pub(crate) fn report_action_failure(
    ctx: &RouteContext,
    error: &ApiError,
    login_notice: &str,
    fallback: &str,
) -> ActionOutcome {
    if error.is_auth_unrecoverable() {
        ctx.notifier.error(login_notice);
        tracing::debug!(to = LOGIN_PATH, "redirecting after auth failure");
        return ActionOutcome::Redirect(LOGIN_PATH.to_owned());
    }
    ctx.notifier.error(user_message(error, fallback));
    ActionOutcome::Handled
}

/// Server-provided message, or `fallback` when there is nothing useful to show.
pub(crate) fn user_message<'a>(error: &'a ApiError, fallback: &'a str) -> &'a str {
    let message = error.message.trim();
    if error.status == NO_RESPONSE_STATUS || message.is_empty() || message == GENERIC_ERROR_MESSAGE {
        fallback
    } else {
        message
    }
}

/// Build an API path from raw segments, percent-encoding each one.
pub(crate) fn api_path(segments: &[&str]) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
        return format!("/{}", segments.join("/"));
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_owned()
}

/// Append form-encoded query pairs to `path`.
pub(crate) fn path_with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
        return path.to_owned();
    };
    url.query_pairs_mut().extend_pairs(pairs);
    match url.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_owned(),
    }
}

#[cfg(test)]
#[path = "testing_test.rs"]
pub(crate) mod testing;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
