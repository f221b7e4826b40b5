//! # Persistent Key-Value Store
//!
//! Durable storage for session artifacts (tokens, the signed-in profile).
//!
//! ```text
//!   Storage (fail-soft, JSON values)
//!      │
//!      ▼
//!   Arc<dyn StorageBackend> (raw strings, Result-returning)
//!      ├── FileBackend    ~/.trailguide/storage/store.json
//!      └── MemoryBackend  process-local, gone on exit
//! ```
//!
//! Backends report failures as `StorageError`. `Storage` never does: every
//! failure is logged and turned into `None` / `false`.
//!
//! The backend is picked once at startup from [`BackendKind`]. Asking for
//! `File` when the directory can't be opened degrades to `Memory` with a
//! warning, so callers must not assume values survive a restart.

pub mod file;
pub mod memory;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use file::FileBackend;
pub use memory::MemoryBackend;

#[derive(Debug)]
pub enum StorageError {
    /// Disk I/O failed.
    Io(io::Error),
    /// A value or the store document wasn't valid JSON.
    Serialization(serde_json::Error),
    /// The backend can't serve requests at all (poisoned lock, no home dir).
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Serialization(e) => write!(f, "storage serialization error: {e}"),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e)
    }
}

/// A raw string key-value backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short name for logs ("file", "memory").
    fn name(&self) -> &str;

    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}

/// Which backend to open at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

impl BackendKind {
    /// Parses `"file"` / `"memory"` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Some(BackendKind::File),
            "memory" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

/// Returns `~/.trailguide/storage/`, without creating it.
pub fn default_storage_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".trailguide").join("storage"))
}

/// Fail-soft JSON store over a [`StorageBackend`].
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn StorageBackend>,
}

impl Storage {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Opens the requested backend, degrading to memory if a file store
    /// can't be opened in `dir` (or the default directory when `None`).
    pub fn open(kind: BackendKind, dir: Option<&Path>) -> Self {
        match kind {
            BackendKind::Memory => {
                debug!("Using in-memory storage backend");
                Self::in_memory()
            }
            BackendKind::File => {
                let dir = match dir.map(Path::to_path_buf).or_else(default_storage_dir) {
                    Some(d) => d,
                    None => {
                        warn!("No home directory for durable storage, falling back to in-memory storage");
                        return Self::in_memory();
                    }
                };
                match FileBackend::open(&dir) {
                    Ok(backend) => {
                        debug!("Using file storage backend at {}", dir.display());
                        Self::new(Arc::new(backend))
                    }
                    Err(e) => {
                        warn!(
                            "Durable storage at {} unavailable ({}), falling back to in-memory storage",
                            dir.display(),
                            e
                        );
                        Self::in_memory()
                    }
                }
            }
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Reads and decodes `key`. `None` if absent or on any failure.
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read '{}' from {} storage: {}", key, self.backend.name(), e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Failed to decode stored value for '{}': {}", key, e);
                None
            }
        }
    }

    /// Encodes and writes `value` under `key`. `false` on any failure.
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to encode value for '{}': {}", key, e);
                return false;
            }
        };
        match self.backend.set_item(key, &raw).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write '{}' to {} storage: {}", key, self.backend.name(), e);
                false
            }
        }
    }

    pub async fn remove_item(&self, key: &str) -> bool {
        match self.backend.remove_item(key).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to remove '{}' from {} storage: {}", key, self.backend.name(), e);
                false
            }
        }
    }

    pub async fn clear(&self) -> bool {
        match self.backend.clear().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to clear {} storage: {}", self.backend.name(), e);
                false
            }
        }
    }
}
