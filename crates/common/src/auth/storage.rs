//! Token storage backends
//!
//! Abstracts credential persistence behind the [`TokenStore`] trait so the
//! session manager can run against durable storage in the app and an
//! in-memory store in tests. Only the session manager writes a store; every
//! other code path reads the access token through it.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::types::TokenPair;

/// Trait for credential pair storage
///
/// Errors are plain strings: storage backends differ too much (filesystem,
/// platform keystores) for a shared structured error to pay its way.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist the credential pair, replacing any previous pair
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    async fn store(&self, tokens: &TokenPair) -> Result<(), String>;

    /// Load the current credential pair
    ///
    /// # Returns
    /// `None` when no session is persisted (logged out)
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    async fn load(&self) -> Result<Option<TokenPair>, String>;

    /// Delete the credential pair
    ///
    /// Deleting an already-empty store is not an error.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    async fn clear(&self) -> Result<(), String>;
}

/// In-memory token store
///
/// Default for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store(&self, tokens: &TokenPair) -> Result<(), String> {
        *self.inner.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>, String> {
        Ok(self.inner.read().await.clone())
    }

    async fn clear(&self) -> Result<(), String> {
        *self.inner.write().await = None;
        Ok(())
    }
}

/// File-backed token store
///
/// Persists the pair as a small JSON document. Writes go through a sibling
/// temp file and a rename so a crash mid-write never leaves a truncated
/// credential file behind.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file path
    ///
    /// The file does not need to exist yet; a missing file reads as a
    /// logged-out session.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn store(&self, tokens: &TokenPair) -> Result<(), String> {
        let payload = serde_json::to_vec_pretty(tokens)
            .map_err(|e| format!("failed to encode tokens: {e}"))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, &payload)
            .await
            .map_err(|e| format!("failed to write {}: {e}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| format!("failed to replace {}: {e}", self.path.display()))?;

        debug!(path = %self.path.display(), "credential pair persisted");
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenPair>, String> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(format!("failed to read {}: {err}", self.path.display())),
        };

        let pair: TokenPair = serde_json::from_slice(&bytes)
            .map_err(|e| format!("failed to decode {}: {e}", self.path.display()))?;
        Ok(Some(pair))
    }

    async fn clear(&self) -> Result<(), String> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(format!("failed to delete {}: {err}", self.path.display())),
        }
    }
}
