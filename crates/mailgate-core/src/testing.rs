//! Store doubles shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::store::{KeyValueStore, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Set,
    Delete,
}

/// Wraps a store and fails selected operations.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    rules: Arc<Mutex<Vec<(Op, Option<String>)>>>,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            rules: Arc::default(),
        }
    }

    /// Fails every `op`.
    pub fn fail(&self, op: Op) {
        self.rules.lock().unwrap().push((op, None));
    }

    /// Fails `op` on `key` only.
    pub fn fail_key(&self, op: Op, key: &str) {
        self.rules.lock().unwrap().push((op, Some(key.to_string())));
    }

    pub fn heal(&self) {
        self.rules.lock().unwrap().clear();
    }

    fn check(&self, op: Op, key: &str) -> StorageResult<()> {
        let rules = self.rules.lock().unwrap();
        let hit = rules
            .iter()
            .any(|(o, k)| *o == op && k.as_deref().is_none_or(|k| k == key));
        if hit {
            Err(StorageError::Unavailable(format!("simulated {op:?} fault on {key}")))
        } else {
            Ok(())
        }
    }
}

impl<S: KeyValueStore> KeyValueStore for FaultyStore<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check(Op::Get, key)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check(Op::Set, key)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.check(Op::Delete, key)?;
        self.inner.delete(key).await
    }
}

/// Store whose writes, or reads of one key, wait until released.
#[derive(Debug, Clone)]
pub struct GatedStore<S> {
    inner: S,
    release: Arc<Notify>,
    held_read: Option<String>,
}

impl<S> GatedStore<S> {
    /// Holds every write, to keep a login or logout open.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            release: Arc::new(Notify::new()),
            held_read: None,
        }
    }

    /// Holds reads of `key` only; writes go straight through.
    pub fn holding_read(inner: S, key: &str) -> Self {
        Self {
            held_read: Some(key.to_string()),
            ..Self::new(inner)
        }
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Lets one pending (or the next) held operation through.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn hold_write(&self) {
        if self.held_read.is_none() {
            self.release.notified().await;
        }
    }
}

impl<S: KeyValueStore> KeyValueStore for GatedStore<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.held_read.as_deref() == Some(key) {
            self.release.notified().await;
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.hold_write().await;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.hold_write().await;
        self.inner.delete(key).await
    }
}
