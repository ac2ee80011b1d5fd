//! Durable storage of the login session.
//!
//! A session is two values written under two keys: the [`SessionRecord`]
//! describing how the login happened and the [`UserIdentity`] it produced.
//! They are saved, loaded and cleared together.

use mailgate_login::SessionRecord;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::identity::UserIdentity;
use crate::store::{KeyValueStore, StorageResult};

/// Key holding the serialized [`SessionRecord`].
pub const AUTH_KEY: &str = "seznam_auth_data";

/// Key holding the serialized [`UserIdentity`].
pub const USER_KEY: &str = "seznam_user_data";

/// Session persistence over any [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wraps a key/value store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying key/value store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.store
    }

    /// Loads the stored session.
    ///
    /// Never fails: read errors, corrupt data, a missing half of the pair or
    /// an identity that is not authenticated all count as "no session".
    pub async fn load(&self) -> Option<(SessionRecord, UserIdentity)> {
        let record = self.read::<SessionRecord>(AUTH_KEY).await;
        let identity = self.read::<UserIdentity>(USER_KEY).await;

        match (record, identity) {
            (Some(record), Some(identity)) if identity.is_valid() => {
                debug!("Loaded session for {}", identity.email);
                Some((record, identity))
            }
            (Some(_), Some(identity)) => {
                warn!("Stored identity for {:?} is not valid, ignoring session", identity.email);
                None
            }
            (None, None) => {
                debug!("No stored session");
                None
            }
            _ => {
                warn!("Stored session is incomplete, ignoring it");
                None
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                error!("Error reading {key}: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Error parsing {key}: {e}");
                None
            }
        }
    }

    /// Saves the session.
    ///
    /// Both values are serialized before anything is written. If the second
    /// write fails the first is rolled back to whatever it held before, so
    /// `load` sees the new session, the previous one or none, unless the
    /// process dies between the two writes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or either write fails.
    pub async fn save(&self, record: &SessionRecord, identity: &UserIdentity) -> StorageResult<()> {
        let record_json = serde_json::to_string(record)?;
        let identity_json = serde_json::to_string(identity)?;

        let previous = match self.store.get(AUTH_KEY).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Could not read previous {AUTH_KEY}, rollback will delete it: {e}");
                None
            }
        };

        self.store.set(AUTH_KEY, &record_json).await?;

        if let Err(e) = self.store.set(USER_KEY, &identity_json).await {
            warn!("Failed to store identity, rolling back session record: {e}");
            let rollback = match previous.as_deref() {
                Some(previous) => self.store.set(AUTH_KEY, previous).await,
                None => self.store.delete(AUTH_KEY).await,
            };
            if let Err(rollback) = rollback {
                error!("Rollback of {AUTH_KEY} failed: {rollback}");
            }
            return Err(e);
        }

        debug!("Saved session for {}", identity.email);
        Ok(())
    }

    /// Removes the session. Clearing an absent session succeeds.
    ///
    /// Both keys are attempted even if the first delete fails.
    ///
    /// # Errors
    ///
    /// Returns the first delete error.
    pub async fn clear(&self) -> StorageResult<()> {
        let auth = self.store.delete(AUTH_KEY).await;
        let user = self.store.delete(USER_KEY).await;

        auth.and(user)?;
        debug!("Cleared stored session");
        Ok(())
    }
}
