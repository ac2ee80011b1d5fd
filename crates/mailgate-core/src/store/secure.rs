//! Secure session storage using system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageResult};

/// Default service name used for keyring entries.
pub const SERVICE_NAME: &str = "mailgate";

/// Key/value store backed by the system keyring.
///
/// Every key is its own keyring entry under a shared service name.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyringStore {
    /// Creates a store using `service` as the keyring service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Service name entries are stored under.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> StorageResult<Entry> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("No keyring entry for {key}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entry(key)?.set_password(value)?;
        debug!("Stored keyring entry {key}");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                debug!("Deleted keyring entry {key}");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No keyring entry to delete for {key}");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete keyring entry {key}: {e}");
                Err(e.into())
            }
        }
    }
}
