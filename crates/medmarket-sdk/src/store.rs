//! Token storage.
//!
//! [`TokenStore`] is the key/value contract the client reads credentials
//! from. [`FileTokenStore`] persists them as JSON in the user config
//! directory so a session survives restarts; [`MemoryTokenStore`] keeps
//! them in memory only.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use medmarket_models::{CredentialPair, TokenKey};
use tracing::{debug, warn};

use crate::error::SdkError;

const APP_DIR: &str = "medmarket";
const TOKENS_FILE: &str = "tokens.json";

/// Persistent access/refresh token storage shared by all clients.
pub trait TokenStore: Send + Sync {
    /// Read a token.
    fn get(&self, key: TokenKey) -> Option<String>;

    /// Store a token, replacing any previous value.
    fn set(&self, key: TokenKey, value: &str);

    /// Delete a token.
    fn remove(&self, key: TokenKey);

    /// Delete both tokens.
    fn clear(&self) {
        self.remove(TokenKey::Access);
        self.remove(TokenKey::Refresh);
    }

    /// Store both halves of a credential pair.
    fn store_credentials(&self, credentials: &CredentialPair) {
        self.set(TokenKey::Access, &credentials.access_token);
        self.set(TokenKey::Refresh, &credentials.refresh_token);
    }

    /// Both tokens, if both are present.
    fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair::new(
            self.get(TokenKey::Access)?,
            self.get(TokenKey::Refresh)?,
        ))
    }
}

/// In-memory [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenKey, String>>,
}

impl MemoryTokenStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with a credential pair.
    pub fn with_credentials(credentials: &CredentialPair) -> Self {
        let store = Self::new();
        store.store_credentials(credentials);
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: TokenKey, value: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
    }

    fn remove(&self, key: TokenKey) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

/// [`TokenStore`] backed by a JSON file.
///
/// Reads are served from an in-memory copy; every write rewrites the file.
/// Write failures are logged and leave the in-memory copy updated.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: RwLock<HashMap<TokenKey, String>>,
}

impl FileTokenStore {
    /// Open (or create) the store at `path`, loading any saved tokens.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SdkError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tokens = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };
        debug!(path = %path.display(), count = tokens.len(), "token store opened");

        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    /// Open the store in the platform config directory
    /// (`<config>/medmarket/tokens.json`).
    pub fn open_default() -> Result<Self, SdkError> {
        Self::open(Self::default_path()?)
    }

    /// Location used by [`open_default`](Self::open_default).
    pub fn default_path() -> Result<PathBuf, SdkError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(TOKENS_FILE))
            .ok_or_else(|| SdkError::Config("could not determine config directory".into()))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, tokens: &HashMap<TokenKey, String>) {
        if let Err(e) = write_atomically(&self.path, tokens) {
            warn!(path = %self.path.display(), error = %e, "failed to persist tokens");
        }
    }
}

fn write_atomically(path: &Path, tokens: &HashMap<TokenKey, String>) -> Result<(), SdkError> {
    let json = serde_json::to_string_pretty(tokens)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: TokenKey, value: &str) {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.insert(key, value.to_string());
        self.persist(&tokens);
    }

    fn remove(&self, key: TokenKey) {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        if tokens.remove(&key).is_some() {
            self.persist(&tokens);
        }
    }
}
