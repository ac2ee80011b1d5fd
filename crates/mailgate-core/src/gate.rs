//! Process-wide authentication state.
//!
//! The [`AuthGate`] is the only writer of [`AuthState`]. Everything else
//! observes it through [`AuthGate::subscribe`] or takes a snapshot with
//! [`AuthGate::state`].
//!
//! Transitions:
//! - `Loading` to `Authenticated` or `Unauthenticated`, by the startup check
//! - `Unauthenticated` to `Authenticated`, by [`AuthGate::login`]
//! - `Authenticated` to `Unauthenticated`, by [`AuthGate::logout`]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use mailgate_login::{LoginHandoff, SessionRecord};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identity::UserIdentity;
use crate::session::SessionStore;
use crate::store::KeyValueStore;

/// Authentication status of the running app.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Startup check has not finished; no routing decision may use this.
    #[default]
    Loading,
    /// A user is logged in.
    Authenticated(UserIdentity),
    /// Nobody is logged in.
    Unauthenticated,
}

impl AuthState {
    /// Returns `true` once the startup check has resolved the state.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Returns `true` if a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Owner of the authentication state and its transitions.
#[derive(Debug)]
pub struct AuthGate<S> {
    sessions: SessionStore<S>,
    state: watch::Sender<AuthState>,
    in_flight: AtomicBool,
    // Bumped by every login/logout transition, under the watch lock.
    generation: AtomicU64,
}

/// Marks a login/logout as running until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| Error::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: KeyValueStore> AuthGate<S> {
    /// Creates a gate in the [`AuthState::Loading`] state.
    ///
    /// Call [`AuthGate::check_auth_status`] before trusting the state.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            sessions: SessionStore::new(store),
            state: watch::Sender::new(AuthState::Loading),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a gate and runs the startup check.
    pub async fn start(store: S) -> Self {
        let gate = Self::new(store);
        gate.check_auth_status().await;
        gate
    }

    /// Session storage used by this gate.
    #[must_use]
    pub const fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Logged-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.state.borrow().user().cloned()
    }

    /// Returns `true` if a user is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Returns `true` until the startup check has run.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.state.borrow().is_resolved()
    }

    /// Resolves the state from the stored session.
    ///
    /// Runs at startup and can be called again to refresh. Never fails; a
    /// session that cannot be read counts as logged out.
    ///
    /// If a login or logout completes while the store is being read, the
    /// result of the read is stale and is dropped; the state that transition
    /// set is returned instead.
    pub async fn check_auth_status(&self) -> AuthState {
        let seen = self.generation.load(Ordering::Acquire);
        let mut resolved = match self.sessions.load().await {
            Some((_, identity)) => {
                debug!("Restored session for {}", identity.email);
                AuthState::Authenticated(identity)
            }
            None => AuthState::Unauthenticated,
        };

        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::Acquire) == seen {
                *state = resolved.clone();
                true
            } else {
                debug!("Session changed during refresh, keeping the newer state");
                resolved = state.clone();
                false
            }
        });
        resolved
    }

    fn transition(&self, next: AuthState) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            *state = next;
        });
    }

    /// Logs in `email` after an external login described by `metadata`.
    ///
    /// The state only changes once the session is durably stored.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCredential`] if `email` is blank
    /// - [`Error::Busy`] if another login/logout is running
    /// - [`Error::Storage`] if the session could not be saved; the state is
    ///   left as it was
    pub async fn login(&self, email: &str, metadata: SessionRecord) -> Result<UserIdentity> {
        let identity = UserIdentity::from_email(email)?;
        let _guard = InFlight::acquire(&self.in_flight).inspect_err(|_| {
            debug!("Login for {email} rejected, another operation is running");
        })?;

        if let Err(e) = self.sessions.save(&metadata, &identity).await {
            warn!("Error during login: {e}");
            return Err(e.into());
        }

        self.transition(AuthState::Authenticated(identity.clone()));
        info!("User logged in successfully: {}", identity.email);
        Ok(identity)
    }

    /// Logs the current user out.
    ///
    /// Always ends in [`AuthState::Unauthenticated`]. If the stored session
    /// cannot be removed the failure is logged and the local state still
    /// flips, so the user is never stuck in a stale logged-in UI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if another login/logout is running.
    pub async fn logout(&self) -> Result<()> {
        let _guard = InFlight::acquire(&self.in_flight).inspect_err(|_| {
            debug!("Logout rejected, another operation is running");
        })?;

        if let Err(e) = self.sessions.clear().await {
            warn!("Stored session could not be cleared during logout: {e}");
        }

        self.transition(AuthState::Unauthenticated);
        info!("User logged out successfully");
        Ok(())
    }
}

impl<S: KeyValueStore> LoginHandoff for AuthGate<S> {
    type Error = Error;

    async fn complete_login(&self, email: &str, record: SessionRecord) -> Result<()> {
        self.login(email, record).await.map(|_| ())
    }

    fn is_busy(error: &Error) -> bool {
        error.is_busy()
    }
}
