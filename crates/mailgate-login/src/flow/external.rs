//! Fallback login through the system browser.
//!
//! Used where no embedded browser is available. The login page is opened
//! externally and the user confirms once they have signed in; there is no
//! navigation to observe.

use tracing::{debug, info, warn};
use url::Url;

use super::{LatchState, LoginHandoff};
use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::session::{LoginMethod, SessionRecord};

/// Manual-confirmation login through an external browser.
#[derive(Debug)]
pub struct ExternalBrowserLogin {
    provider: Provider,
    email: String,
    state: LatchState,
}

impl ExternalBrowserLogin {
    /// Creates a flow that will log in `email` on confirmation.
    #[must_use]
    pub fn new(provider: Provider, email: impl Into<String>) -> Self {
        Self {
            provider,
            email: email.into(),
            state: LatchState::Idle,
        }
    }

    /// Starts an attempt and returns the page to open in the browser.
    pub fn begin_attempt(&mut self) -> &Url {
        debug!("External browser login started for {}", self.email);
        self.state = LatchState::AwaitingResult;
        &self.provider.login_url
    }

    /// Current latch state.
    #[must_use]
    pub const fn state(&self) -> LatchState {
        self.state
    }

    /// User says they are signed in; hands off once per attempt.
    ///
    /// Returns `Ok(false)` if there was nothing to confirm, either because no
    /// attempt was started or because it was already handed off, or if the
    /// receiver reported it was busy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandoffFailure`] if the receiver rejected the login.
    /// The attempt stays armed so the user can confirm again.
    pub async fn confirm<H: LoginHandoff>(&mut self, handoff: H) -> Result<bool> {
        if !self.state.is_armed() {
            debug!("Confirmation ignored in state {:?}", self.state);
            return Ok(false);
        }

        self.state = LatchState::HandoffInFlight;
        let record = SessionRecord::new(LoginMethod::ExternalBrowser);

        match handoff.complete_login(&self.email, record).await {
            Ok(()) => {
                info!("External browser login confirmed for {}", self.email);
                self.state = LatchState::Idle;
                Ok(true)
            }
            Err(e) if H::is_busy(&e) => {
                debug!("Login already in progress, skipping");
                self.state = LatchState::AwaitingResult;
                Ok(false)
            }
            Err(e) => {
                warn!("External browser login failed: {e}");
                self.state = LatchState::AwaitingResult;
                Err(Error::handoff(e))
            }
        }
    }

    /// User backed out without confirming.
    pub fn cancel(&mut self) {
        self.state = LatchState::Idle;
    }
}
