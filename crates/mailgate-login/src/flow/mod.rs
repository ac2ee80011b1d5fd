//! Login flows that hand a detected external login off to the application.

mod embedded;
mod external;
mod form;

pub use embedded::{BrowserEvent, CompletionDetector, DetectorAction};
pub use external::ExternalBrowserLogin;
pub use form::{FormError, LoginForm};

use std::future::Future;

use crate::session::SessionRecord;

/// Receiver of a completed external login.
///
/// Implemented by whatever owns the authentication state. Each flow calls
/// [`LoginHandoff::complete_login`] at most once per successful attempt.
pub trait LoginHandoff {
    /// Error returned when the login is rejected.
    type Error: std::fmt::Display;

    /// Records the login of `email` described by `record`.
    fn complete_login(
        &self,
        email: &str,
        record: SessionRecord,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Returns `true` if `error` only means another login/logout is running.
    ///
    /// Flows treat this as "already in progress" rather than a failure.
    fn is_busy(error: &Self::Error) -> bool {
        let _ = error;
        false
    }
}

impl<T: LoginHandoff> LoginHandoff for &T {
    type Error = T::Error;

    fn complete_login(
        &self,
        email: &str,
        record: SessionRecord,
    ) -> impl Future<Output = Result<(), Self::Error>> {
        (**self).complete_login(email, record)
    }

    fn is_busy(error: &Self::Error) -> bool {
        T::is_busy(error)
    }
}

/// Per-attempt handoff latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchState {
    /// No attempt in progress; events are ignored.
    #[default]
    Idle,
    /// Browser surface is shown and no success has been seen yet.
    AwaitingResult,
    /// A handoff has been issued for this attempt.
    HandoffInFlight,
}

impl LatchState {
    /// Returns `true` if a success would trigger a handoff.
    #[must_use]
    pub const fn is_armed(self) -> bool {
        matches!(self, Self::AwaitingResult)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};

    use super::LoginHandoff;
    use crate::session::SessionRecord;

    /// Handoff double that counts calls and can be told to fail.
    #[derive(Debug, Default)]
    pub struct CountingHandoff {
        pub calls: Cell<usize>,
        pub fail_next: Cell<bool>,
        pub busy_next: Cell<bool>,
        pub received: RefCell<Vec<(String, SessionRecord)>>,
    }

    #[derive(Debug)]
    pub enum HandoffError {
        Rejected,
        Busy,
    }

    impl std::fmt::Display for HandoffError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Rejected => f.write_str("rejected"),
                Self::Busy => f.write_str("busy"),
            }
        }
    }

    impl LoginHandoff for CountingHandoff {
        type Error = HandoffError;

        async fn complete_login(
            &self,
            email: &str,
            record: SessionRecord,
        ) -> Result<(), HandoffError> {
            self.calls.set(self.calls.get() + 1);
            if self.busy_next.replace(false) {
                return Err(HandoffError::Busy);
            }
            if self.fail_next.replace(false) {
                return Err(HandoffError::Rejected);
            }
            self.received.borrow_mut().push((email.to_string(), record));
            Ok(())
        }

        fn is_busy(error: &HandoffError) -> bool {
            matches!(error, HandoffError::Busy)
        }
    }
}
