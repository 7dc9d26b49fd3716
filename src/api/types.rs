//! Request and outcome types shared by the request client and its callers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message carried by every unrecoverable-auth error. Callers that still
/// compare text may rely on this exact string; no other message is stable.
pub const AUTH_REFRESH_FAILED_MESSAGE: &str = "Unable to refresh access token";

/// Fallback when a failed response carries no readable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Status reported when no HTTP response was received at all.
pub const NO_RESPONSE_STATUS: u16 = 0;

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

/// One API call as described by a loader or action. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    path: String,
    method: Method,
    payload: Option<Value>,
    refresh_on_unauthorized: bool,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { path: path.into(), method, payload: None, refresh_on_unauthorized: true }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::Post, path).with_payload(payload)
    }

    #[must_use]
    pub fn put(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::Put, path).with_payload(payload)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns a request error when `body` has no JSON representation.
    pub fn with_json(self, body: &impl Serialize) -> Result<Self, ApiError> {
        let payload = serde_json::to_value(body)
            .map_err(|e| ApiError::request(NO_RESPONSE_STATUS, format!("request body not encodable: {e}")))?;
        Ok(self.with_payload(payload))
    }

    /// Treat a 401 as a plain request error (credential exchange endpoints).
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    #[must_use]
    pub fn refresh_on_unauthorized(&self) -> bool {
        self.refresh_on_unauthorized
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthFailureReason {
    RefreshFailed,
}

/// Final result of one logical API call, including any refresh and retry.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    Success(Value),
    /// The session cannot be recovered; the caller should send the user to login.
    AuthFailure { reason: AuthFailureReason },
    /// Any other failure: validation, not-found, server error, transport.
    RequestError { status: u16, message: String },
}

impl ApiOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Normalized error for the non-success variants.
    #[must_use]
    pub fn error(&self) -> Option<ApiError> {
        match self {
            Self::Success(_) => None,
            Self::AuthFailure { .. } => Some(ApiError::auth_unrecoverable()),
            Self::RequestError { status, message } => Some(ApiError::request(*status, message.clone())),
        }
    }

    /// # Errors
    ///
    /// Returns the normalized error for every non-success variant.
    pub fn into_result(self) -> Result<Value, ApiError> {
        match self {
            Self::Success(body) => Ok(body),
            Self::AuthFailure { .. } => Err(ApiError::auth_unrecoverable()),
            Self::RequestError { status, message } => Err(ApiError::request(status, message)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    AuthUnrecoverable,
    Request,
}

/// The `{message, status}` object handed to error handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn auth_unrecoverable() -> Self {
        Self { kind: ApiErrorKind::AuthUnrecoverable, status: 401, message: AUTH_REFRESH_FAILED_MESSAGE.to_owned() }
    }

    #[must_use]
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self { kind: ApiErrorKind::Request, status, message: message.into() }
    }

    #[must_use]
    pub fn is_auth_unrecoverable(&self) -> bool {
        self.kind == ApiErrorKind::AuthUnrecoverable
    }
}

// =============================================================================
// WIRE ENVELOPE
// =============================================================================

/// Success envelope used by the commerce API: `{ "status": ..., "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Decode the `data` member of a success body into a typed value.
///
/// # Errors
///
/// Returns a request error when the body does not match the envelope or `T`.
pub fn decode_data<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ApiError::request(502, format!("unexpected response from server: {e}")))
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": "..."}`, `{"error": "..."}` and
/// `{"error": {"message": "..."}}`; anything else yields the generic message.
pub(crate) fn error_message_from_body(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return GENERIC_ERROR_MESSAGE.to_owned();
    };
    let candidate = value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .or_else(|| value.pointer("/error/message").and_then(Value::as_str));
    match candidate {
        Some(message) if !message.trim().is_empty() => message.to_owned(),
        _ => GENERIC_ERROR_MESSAGE.to_owned(),
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
