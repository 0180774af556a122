//! Client-local credential persistence.
//!
//! One bearer token is kept under a fixed key. It is read when the real-time
//! channel connects and before every authenticated request; when it is
//! missing, mutating network calls are skipped.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

/// Fixed key the credential token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted home of the credential token.
pub trait TokenStore: Send + Sync {
    /// The stored token, `None` when signed out.
    fn load(&self) -> StorageResult<Option<String>>;

    /// Store `token`, replacing any previous one.
    fn save(&self, token: &str) -> StorageResult<()>;

    /// Forget the token.
    fn clear(&self) -> StorageResult<()>;
}

/// File-backed token store for native platforms.
///
/// The token lives in a file named [`TOKEN_KEY`] inside the base directory.
pub struct FileTokenStore {
    base_path: PathBuf,
}

impl FileTokenStore {
    /// Create a store in `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create credential directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a store in the default location.
    ///
    /// On Unix: `~/.local/share/inkboard/`
    /// On Windows: `%LOCALAPPDATA%\inkboard\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkboard"))
    }

    fn token_path(&self) -> PathBuf {
        self.base_path.join(TOKEN_KEY)
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> StorageResult<Option<String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> StorageResult<()> {
        let path = self.token_path();
        fs::write(&path, token)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn clear(&self) -> StorageResult<()> {
        let path = self.token_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// In-memory token store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StorageResult<Option<String>> {
        let token = self
            .token
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(token.clone())
    }

    fn save(&self, token: &str) -> StorageResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        *slot = None;
        Ok(())
    }
}
