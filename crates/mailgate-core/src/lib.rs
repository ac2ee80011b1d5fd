//! # mailgate-core
//!
//! Authentication core of the mailgate mail client.
//!
//! This crate provides:
//! - Key/value storage backends (keyring, JSON file, memory)
//! - Session storage of the login record and user identity
//! - The auth gate: process-wide authentication state and its transitions
//! - Routes and the route guard that keeps logged-out users on the login screen
//!
//! ```ignore
//! use mailgate_core::{AuthGate, MemoryStore, Route, RouteGuard};
//! use mailgate_login::{LoginMethod, SessionRecord};
//!
//! let gate = AuthGate::start(MemoryStore::new()).await;
//! let mut guard = RouteGuard::new(Route::Inbox);
//! let mut state = gate.subscribe();
//! assert_eq!(guard.sync(&mut state), Some(Route::Login));
//!
//! gate.login("jan@example.com", SessionRecord::new(LoginMethod::ExternalBrowser)).await?;
//! guard.sync(&mut state);
//! assert_eq!(guard.navigate(Route::Login), &Route::Inbox);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod gate;
pub mod identity;
pub mod route;
pub mod session;
pub mod store;
#[cfg(test)]
mod testing;

pub use error::{Error, Result, StorageError};
pub use gate::{AuthGate, AuthState};
pub use identity::UserIdentity;
pub use route::{Route, RouteGuard, redirect_for};
pub use session::{AUTH_KEY, SessionStore, USER_KEY};
pub use store::{
    Backend, BackendKind, FileStore, KeyValueStore, KeyringStore, MemoryStore, SERVICE_NAME,
    StorageResult,
};
