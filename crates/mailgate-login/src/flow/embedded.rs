//! Login completion detection for an embedded browser surface.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{LatchState, LoginHandoff};
use crate::error::Error;
use crate::provider::Provider;
use crate::session::{LoginMethod, SessionRecord};

/// Event emitted by the embedded browser surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    /// The surface navigated to `url`.
    Navigated {
        /// Destination URL.
        url: String,
    },
    /// A page failed to load.
    LoadError {
        /// Description reported by the surface.
        description: String,
    },
    /// The user closed the surface.
    Dismissed,
}

impl BrowserEvent {
    /// Creates a navigation event.
    #[must_use]
    pub fn navigated(url: impl Into<String>) -> Self {
        Self::Navigated { url: url.into() }
    }
}

/// What the surrounding UI should do after an event.
#[derive(Debug)]
pub enum DetectorAction {
    /// Event arrived outside an armed attempt and was dropped.
    Ignored,
    /// Navigation did not indicate success; keep waiting.
    Pending,
    /// Login was handed off. Dismiss the surface and go to the inbox.
    LoggedIn {
        /// Email that was logged in.
        email: String,
    },
    /// Handoff was rejected. Dismiss the surface and show a recoverable error.
    HandoffFailed {
        /// The failure, always [`Error::HandoffFailure`].
        error: Error,
    },
    /// Another login/logout was already running; nothing to report.
    Busy,
    /// Page failed to load. Show the error; the attempt is unaffected.
    LoadFailed {
        /// Description reported by the surface.
        description: String,
    },
    /// User closed the surface before success was detected.
    Cancelled,
}

impl DetectorAction {
    /// Returns `true` if the browser surface should be closed.
    #[must_use]
    pub const fn dismisses_surface(&self) -> bool {
        matches!(
            self,
            Self::LoggedIn { .. } | Self::HandoffFailed { .. } | Self::Cancelled
        )
    }
}

/// Watches embedded browser navigation and hands off exactly once.
#[derive(Debug)]
pub struct CompletionDetector<H> {
    handoff: H,
    provider: Provider,
    email: String,
    state: LatchState,
}

impl<H: LoginHandoff> CompletionDetector<H> {
    /// Creates a detector that will log in `email` on success.
    #[must_use]
    pub fn new(handoff: H, provider: Provider, email: impl Into<String>) -> Self {
        Self {
            handoff,
            provider,
            email: email.into(),
            state: LatchState::Idle,
        }
    }

    /// Current latch state.
    #[must_use]
    pub const fn state(&self) -> LatchState {
        self.state
    }

    /// Provider this detector matches against.
    #[must_use]
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Starts a fresh attempt; call whenever the surface is shown.
    ///
    /// Returns the URL the surface should load.
    pub fn begin_attempt(&mut self) -> &str {
        debug!("Login attempt started for {}", self.email);
        self.state = LatchState::AwaitingResult;
        self.provider.login_url.as_str()
    }

    /// Handles one browser event.
    pub async fn on_event(&mut self, event: BrowserEvent) -> DetectorAction {
        match event {
            BrowserEvent::Navigated { url } => self.on_navigation(url).await,
            BrowserEvent::LoadError { description } => {
                warn!("Browser surface failed to load: {description}");
                DetectorAction::LoadFailed { description }
            }
            BrowserEvent::Dismissed => {
                info!("Login surface closed by user");
                self.state = LatchState::Idle;
                DetectorAction::Cancelled
            }
        }
    }

    async fn on_navigation(&mut self, url: String) -> DetectorAction {
        debug!("Browser navigation: {url}");

        if !self.state.is_armed() {
            debug!("Navigation ignored in state {:?}", self.state);
            return DetectorAction::Ignored;
        }

        if !self.provider.is_login_success(&url) {
            return DetectorAction::Pending;
        }

        info!("Successful login detected at {url}");
        self.state = LatchState::HandoffInFlight;

        let record = SessionRecord::new(LoginMethod::EmbeddedBrowser).with_login_url(url);
        match self.handoff.complete_login(&self.email, record).await {
            Ok(()) => {
                self.state = LatchState::Idle;
                DetectorAction::LoggedIn {
                    email: self.email.clone(),
                }
            }
            Err(e) if H::is_busy(&e) => {
                debug!("Login already in progress, skipping");
                self.state = LatchState::AwaitingResult;
                DetectorAction::Busy
            }
            Err(e) => {
                warn!("Login handoff failed: {e}");
                self.state = LatchState::AwaitingResult;
                DetectorAction::HandoffFailed {
                    error: Error::handoff(e),
                }
            }
        }
    }

    /// Consumes browser events until the surface is dismissed.
    ///
    /// Every non-trivial action is passed to `report`. Returns the action
    /// that dismissed the surface, leaving later events unread. After
    /// [`DetectorAction::HandoffFailed`] the latch stays armed; a retry
    /// starts with [`CompletionDetector::begin_attempt`] on a fresh surface.
    ///
    /// Returns `None` if the stream closed first, in which case the attempt
    /// is treated as cancelled.
    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<BrowserEvent>,
        mut report: impl FnMut(&DetectorAction),
    ) -> Option<DetectorAction> {
        while let Some(event) = events.recv().await {
            let action = self.on_event(event).await;
            if !matches!(action, DetectorAction::Ignored | DetectorAction::Pending) {
                report(&action);
            }
            if action.dismisses_surface() {
                return Some(action);
            }
        }

        debug!("Browser event stream closed");
        self.state = LatchState::Idle;
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::flow::testing::CountingHandoff;

    fn detector(handoff: &CountingHandoff) -> CompletionDetector<&CountingHandoff> {
        CompletionDetector::new(handoff, Provider::seznam(), "jan@example.com")
    }

    #[tokio::test]
    async fn test_begin_attempt_returns_login_url() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        assert_eq!(detector.state(), LatchState::Idle);
        assert_eq!(detector.begin_attempt(), "https://login.szn.cz/");
        assert_eq!(detector.state(), LatchState::AwaitingResult);
    }

    #[tokio::test]
    async fn test_two_success_urls_hand_off_once() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let first = detector
            .on_event(BrowserEvent::navigated("https://email.cz/"))
            .await;
        let second = detector
            .on_event(BrowserEvent::navigated("https://homepage.szn.cz/"))
            .await;

        assert!(matches!(first, DetectorAction::LoggedIn { ref email } if email == "jan@example.com"));
        assert!(first.dismisses_surface());
        assert!(matches!(second, DetectorAction::Ignored));
        assert_eq!(handoff.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_handoff_record_carries_terminal_url() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        detector
            .on_event(BrowserEvent::navigated("https://szn.cz/welcome"))
            .await;

        let received = handoff.received.borrow();
        let (email, record) = &received[0];
        assert_eq!(email, "jan@example.com");
        assert_eq!(record.login_method, LoginMethod::EmbeddedBrowser);
        assert_eq!(record.login_url.as_deref(), Some("https://szn.cz/welcome"));
    }

    #[tokio::test]
    async fn test_login_pages_keep_waiting() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        for url in ["https://login.szn.cz/", "https://login.szn.cz/step2"] {
            let action = detector.on_event(BrowserEvent::navigated(url)).await;
            assert!(matches!(action, DetectorAction::Pending));
        }
        assert_eq!(handoff.calls.get(), 0);
        assert_eq!(detector.state(), LatchState::AwaitingResult);
    }

    #[tokio::test]
    async fn test_events_before_attempt_are_ignored() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);

        let action = detector
            .on_event(BrowserEvent::navigated("https://email.cz/"))
            .await;
        assert!(matches!(action, DetectorAction::Ignored));
        assert_eq!(handoff.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_failed_handoff_rearms_latch() {
        let handoff = CountingHandoff::default();
        handoff.fail_next.set(true);
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let action = detector
            .on_event(BrowserEvent::navigated("https://email.cz/"))
            .await;
        assert!(matches!(
            action,
            DetectorAction::HandoffFailed {
                error: Error::HandoffFailure(_)
            }
        ));
        assert!(action.dismisses_surface());
        assert_eq!(detector.state(), LatchState::AwaitingResult);

        let retry = detector
            .on_event(BrowserEvent::navigated("https://email.cz/inbox"))
            .await;
        assert!(matches!(retry, DetectorAction::LoggedIn { .. }));
        assert_eq!(handoff.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_busy_handoff_is_not_a_failure() {
        let handoff = CountingHandoff::default();
        handoff.busy_next.set(true);
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let action = detector
            .on_event(BrowserEvent::navigated("https://email.cz/"))
            .await;
        assert!(matches!(action, DetectorAction::Busy));
        assert!(!action.dismisses_surface());
        assert_eq!(detector.state(), LatchState::AwaitingResult);
    }

    #[tokio::test]
    async fn test_load_error_leaves_latch_alone() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let action = detector
            .on_event(BrowserEvent::LoadError {
                description: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })
            .await;
        assert!(matches!(action, DetectorAction::LoadFailed { .. }));
        assert!(!action.dismisses_surface());
        assert_eq!(detector.state(), LatchState::AwaitingResult);
    }

    #[tokio::test]
    async fn test_dismissal_resets_without_handoff() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let action = detector.on_event(BrowserEvent::Dismissed).await;
        assert!(matches!(action, DetectorAction::Cancelled));
        assert_eq!(detector.state(), LatchState::Idle);

        let late = detector
            .on_event(BrowserEvent::navigated("https://email.cz/"))
            .await;
        assert!(matches!(late, DetectorAction::Ignored));
        assert_eq!(handoff.calls.get(), 0);

        detector.begin_attempt();
        let fresh = detector
            .on_event(BrowserEvent::navigated("https://email.cz/"))
            .await;
        assert!(matches!(fresh, DetectorAction::LoggedIn { .. }));
    }

    #[tokio::test]
    async fn test_run_stops_at_first_login() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let (tx, mut rx) = mpsc::channel(8);
        for event in [
            BrowserEvent::navigated("https://login.szn.cz/"),
            BrowserEvent::LoadError {
                description: "timeout".to_string(),
            },
            BrowserEvent::navigated("https://email.cz/"),
            BrowserEvent::navigated("https://email.cz/inbox"),
        ] {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let mut reported = Vec::new();
        let result = detector
            .run(&mut rx, |action| reported.push(format!("{action:?}")))
            .await;

        assert!(matches!(result, Some(DetectorAction::LoggedIn { .. })));
        assert_eq!(reported.len(), 2);
        assert!(reported[0].starts_with("LoadFailed"));
        assert_eq!(handoff.calls.get(), 1);
    }

    #[tokio::test]
    async fn test_run_without_success_cancels() {
        let handoff = CountingHandoff::default();
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let (tx, mut rx) = mpsc::channel(2);
        tx.send(BrowserEvent::navigated("https://login.szn.cz/"))
            .await
            .unwrap();
        drop(tx);

        let result = detector.run(&mut rx, |_| {}).await;
        assert!(result.is_none());
        assert_eq!(detector.state(), LatchState::Idle);
        assert_eq!(handoff.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_reading_after_failed_handoff() {
        let handoff = CountingHandoff::default();
        handoff.fail_next.set(true);
        let mut detector = detector(&handoff);
        detector.begin_attempt();

        let (tx, mut rx) = mpsc::channel(4);
        tx.send(BrowserEvent::navigated("https://email.cz/"))
            .await
            .unwrap();
        tx.send(BrowserEvent::navigated("https://email.cz/inbox"))
            .await
            .unwrap();
        drop(tx);

        let mut reported = 0;
        let result = detector.run(&mut rx, |_| reported += 1).await;

        assert!(matches!(result, Some(DetectorAction::HandoffFailed { .. })));
        assert_eq!(reported, 1);
        assert_eq!(handoff.calls.get(), 1);
        assert_eq!(detector.state(), LatchState::AwaitingResult);
        assert_eq!(
            rx.recv().await,
            Some(BrowserEvent::navigated("https://email.cz/inbox"))
        );
    }
}
