//! Storefront configuration parsed from environment variables.
//!
//! Resolved once at startup and treated as read-only afterward. Every other
//! component receives the parsed [`StorefrontConfig`] rather than reading the
//! environment itself.

use std::path::PathBuf;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing config: env var {var} not set")]
    Missing { var: String },

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Commerce API base URL without a trailing slash.
    pub api_base_url: String,
    /// Path of the access-token refresh endpoint, relative to the base URL.
    pub refresh_path: String,
    /// When set, the access token is persisted to this file.
    pub token_file: Option<PathBuf>,
    pub timeouts: HttpTimeouts,
}

impl StorefrontConfig {
    /// Build a config for `api_base_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: normalize_base_url(api_base_url)?,
            refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
            token_file: None,
            timeouts: HttpTimeouts::default(),
        })
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `APP_API_BASEURL`
    ///
    /// Optional:
    /// - `APP_API_REFRESH_PATH`: default `/auth/refresh-token`
    /// - `APP_API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `APP_API_CONNECT_TIMEOUT_SECS`: default 10
    /// - `APP_TOKEN_FILE`: persist the access token to this path
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_base = std::env::var("APP_API_BASEURL").map_err(|_| ConfigError::Missing { var: "APP_API_BASEURL".into() })?;
        let api_base_url = normalize_base_url(&raw_base)?;

        let refresh_path = normalize_path(
            &std::env::var("APP_API_REFRESH_PATH").unwrap_or_else(|_| DEFAULT_REFRESH_PATH.to_owned()),
        );
        let token_file = std::env::var("APP_TOKEN_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("APP_API_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("APP_API_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_base_url, refresh_path, token_file, timeouts })
    }

    /// Join the base URL and an API path such as `/products/abc`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, normalize_path(path))
    }

    /// Absolute URL of the refresh endpoint.
    #[must_use]
    pub fn refresh_endpoint(&self) -> String {
        self.endpoint(&self.refresh_path)
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::Parse(format!("invalid APP_API_BASEURL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Parse(format!("unsupported APP_API_BASEURL scheme '{}'", url.scheme())));
    }
    Ok(trimmed.to_owned())
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') { path.to_owned() } else { format!("/{path}") }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
