//! Credential providers.
//!
//! The dispatcher never owns tokens. It asks a [`CredentialProvider`] for the
//! current ones on every send and, when a [`TokenRefresher`] is configured,
//! hands refreshed pairs back through [`CredentialProvider::set_tokens`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Default credentials file name within the portico config directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// An access token with its optional refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Source of the tokens attached to outbound requests.
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    /// Current access token, if any.
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if any.
    fn refresh_token(&self) -> Option<String> {
        None
    }

    /// Store a freshly refreshed pair.
    fn set_tokens(&self, _tokens: &TokenPair) {}
}

/// Exchanges a refresh token for a new [`TokenPair`].
#[async_trait]
pub trait TokenRefresher: Send + Sync + std::fmt::Debug {
    async fn refresh(&self, refresh_token: Option<String>) -> Result<TokenPair>;
}

/// Authentication capabilities handed to the dispatcher at construction.
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub(crate) provider: Arc<dyn CredentialProvider>,
    pub(crate) refresher: Option<Arc<dyn TokenRefresher>>,
}

impl AuthOptions {
    /// Attach tokens from `provider`, without automatic refresh.
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            refresher: None,
        }
    }

    /// Enable the refresh-and-retry protocol on 401 responses.
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn provider(&self) -> &Arc<dyn CredentialProvider> {
        &self.provider
    }

    pub fn can_refresh(&self) -> bool {
        self.refresher.is_some()
    }
}

// ============================================================================
// MemoryCredentials
// ============================================================================

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    tokens: RwLock<Option<TokenPair>>,
    store_count: AtomicU32,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
            store_count: AtomicU32::new(0),
        }
    }

    /// Number of times [`CredentialProvider::set_tokens`] has been called.
    pub fn store_count(&self) -> u32 {
        self.store_count.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.tokens.read().clone()
    }

    pub fn clear(&self) {
        *self.tokens.write() = None;
    }
}

impl CredentialProvider for MemoryCredentials {
    fn access_token(&self) -> Option<String> {
        self.tokens.read().as_ref().map(|t| t.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }

    fn set_tokens(&self, tokens: &TokenPair) {
        self.store_count.fetch_add(1, Ordering::SeqCst);
        *self.tokens.write() = Some(tokens.clone());
    }
}

// ============================================================================
// FileCredentials
// ============================================================================

/// File-backed credential store with an in-memory cache.
#[derive(Debug)]
pub struct FileCredentials {
    path: PathBuf,
    cached: RwLock<Option<TokenPair>>,
}

impl FileCredentials {
    /// Open (or prepare) the credentials file at `path`.
    ///
    /// A missing file is not an error; it simply means no tokens yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cached = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ApiError::invalid_request(format!(
                    "failed to read credentials file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Some(serde_json::from_str(&content).map_err(|e| {
                ApiError::decode(format!(
                    "failed to parse credentials file {}: {}",
                    path.display(),
                    e
                ))
            })?)
        } else {
            None
        };

        Ok(Self {
            path,
            cached: RwLock::new(cached),
        })
    }

    /// Open the default credentials file within `dir`.
    pub fn in_dir(dir: &Path) -> Result<Self> {
        Self::open(dir.join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_tokens(&self) -> bool {
        self.cached.read().is_some()
    }

    /// Persist `tokens`, replacing whatever was stored.
    pub fn save(&self, tokens: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiError::invalid_request(format!("failed to create credentials directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, json).map_err(|e| {
            ApiError::invalid_request(format!("failed to write credentials file: {}", e))
        })?;

        *self.cached.write() = Some(tokens.clone());
        tracing::debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }

    /// Delete stored credentials.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                ApiError::invalid_request(format!("failed to delete credentials file: {}", e))
            })?;
        }
        *self.cached.write() = None;
        Ok(())
    }
}

impl CredentialProvider for FileCredentials {
    fn access_token(&self) -> Option<String> {
        self.cached.read().as_ref().map(|t| t.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.cached
            .read()
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }

    fn set_tokens(&self, tokens: &TokenPair) {
        let mut next = tokens.clone();
        if next.refresh_token.is_none() {
            next.refresh_token = self.refresh_token();
        }
        if let Err(e) = self.save(&next) {
            tracing::warn!(error = %e, "failed to persist refreshed credentials");
            *self.cached.write() = Some(next);
        }
    }
}
