//! Commerce API access: authenticated requests, token refresh, outcome types.

pub mod client;
pub mod refresh;
pub mod types;

pub use client::ApiClient;
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, RefreshError, RefreshWindow, TokenRefresher};
pub use types::{
    AUTH_REFRESH_FAILED_MESSAGE, ApiError, ApiErrorKind, ApiOutcome, AuthFailureReason, Envelope, GENERIC_ERROR_MESSAGE,
    Method, RequestDescriptor, decode_data,
};
