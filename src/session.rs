//! Access-token storage for the current storefront session.
//!
//! DESIGN
//! ======
//! The store is the only mutable state shared by every request. Call sites
//! depend on the [`TokenStore`] trait so the backing strategy (memory or a
//! JSON file on disk) can change without touching them.
//!
//! Lifecycle: empty at bootstrap, written by login and by a successful
//! refresh, cleared by logout and by an unrecoverable refresh failure.
//! The refresh credential itself is an HTTP-only cookie owned by the server
//! and never passes through this module.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

// =============================================================================
// ACCESS TOKEN
// =============================================================================

/// Opaque short-lived credential attached to authenticated requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Process-wide holder of the current access token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<AccessToken>;
    fn set(&self, token: AccessToken);
    fn clear(&self);
}

/// In-memory store; the session ends with the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<AccessToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        Self { token: RwLock::new(Some(token)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.token.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn set(&self, token: AccessToken) {
        *self.token.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    #[serde(rename = "accessToken")]
    access_token: AccessToken,
}

/// Store that mirrors the token into a JSON file so it survives restarts.
///
/// Reads are served from memory. Write failures are logged and do not
/// affect the in-memory value. `set` and `clear` touch the file with blocking
/// `std::fs` calls from inside the refresh future. That suits the one-shot
/// CLI; a long-lived process should move them to `spawn_blocking`.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: MemoryTokenStore,
}

impl FileTokenStore {
    /// Open the store at `path`, loading a previously persisted token.
    /// A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let cached = match std::fs::read(&path) {
            Ok(bytes) => {
                let persisted: PersistedSession = serde_json::from_slice(&bytes)?;
                MemoryTokenStore::with_token(persisted.access_token)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MemoryTokenStore::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, cached })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, token: &AccessToken) -> Result<(), StoreError> {
        let body = serde_json::to_vec(&PersistedSession { access_token: token.clone() })?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<AccessToken> {
        self.cached.get()
    }

    fn set(&self, token: AccessToken) {
        if let Err(e) = self.persist(&token) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist access token");
        }
        self.cached.set(token);
    }

    fn clear(&self) {
        self.cached.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to remove token file"),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
