//! Durable key/value storage backends.
//!
//! The session store only needs string get/set/delete. The medium differs by
//! platform:
//! - [`KeyringStore`]: secure on-device storage (Secret Service, Keychain,
//!   Credential Manager)
//! - [`FileStore`]: a single JSON file, the analogue of browser local storage
//! - [`MemoryStore`]: process-local, for tests and throwaway sessions
//!
//! [`Backend`] picks one of them once at startup.

mod file;
mod memory;
mod secure;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use secure::{KeyringStore, SERVICE_NAME};

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Error type for durable store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] ::keyring::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Store cannot be used right now.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for durable store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Uniform string key/value interface over a storage medium.
///
/// Each individual operation is atomic. Deleting a missing key succeeds.
pub trait KeyValueStore {
    /// Reads `key`, returning `None` if it is absent.
    fn get(&self, key: &str) -> impl Future<Output = StorageResult<Option<String>>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = StorageResult<()>>;

    /// Removes `key`.
    fn delete(&self, key: &str) -> impl Future<Output = StorageResult<()>>;
}

/// Storage medium selected in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// System keyring.
    #[default]
    Keyring,
    /// JSON file on disk.
    File,
    /// In-memory only; nothing survives a restart.
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

/// Concrete storage backend chosen at startup.
#[derive(Debug, Clone)]
pub enum Backend {
    /// System keyring.
    Keyring(KeyringStore),
    /// JSON file on disk.
    File(FileStore),
    /// In-memory map.
    Memory(MemoryStore),
}

impl Backend {
    /// Builds the backend for `kind`.
    ///
    /// `file_path` is only used by [`BackendKind::File`].
    #[must_use]
    pub fn from_kind(kind: BackendKind, service: &str, file_path: PathBuf) -> Self {
        match kind {
            BackendKind::Keyring => Self::Keyring(KeyringStore::new(service)),
            BackendKind::File => Self::File(FileStore::new(file_path)),
            BackendKind::Memory => Self::Memory(MemoryStore::new()),
        }
    }

    /// Kind of this backend.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Keyring(_) => BackendKind::Keyring,
            Self::File(_) => BackendKind::File,
            Self::Memory(_) => BackendKind::Memory,
        }
    }
}

impl KeyValueStore for Backend {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Keyring(store) => store.get(key).await,
            Self::File(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Keyring(store) => store.set(key, value).await,
            Self::File(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self {
            Self::Keyring(store) => store.delete(key).await,
            Self::File(store) => store.delete(key).await,
            Self::Memory(store) => store.delete(key).await,
        }
    }
}
