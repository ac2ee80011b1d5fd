//! # mailgate-login
//!
//! External identity-provider login for the mailgate mail client.
//!
//! The provider's protocol is treated as opaque: the user signs in inside a
//! browser surface and this crate decides, from the URLs that surface visits,
//! when the login has succeeded.
//!
//! ## Features
//!
//! - **Provider configuration**: login page and success markers, Seznam.cz by default
//! - **Completion detection**: navigation-driven, with a per-attempt handoff latch
//! - **External browser fallback**: manual confirmation where no embedded browser exists
//! - **Session metadata**: serializable record of how a login happened
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailgate_login::{BrowserEvent, CompletionDetector, DetectorAction, Provider};
//!
//! // `gate` implements `LoginHandoff`
//! let mut detector = CompletionDetector::new(&gate, Provider::seznam(), "jan@example.com");
//! let start_url = detector.begin_attempt().to_string();
//! // ... show the browser surface on `start_url` ...
//!
//! match detector.on_event(BrowserEvent::navigated("https://email.cz/")).await {
//!     DetectorAction::LoggedIn { email } => println!("Welcome {email}"),
//!     other => println!("{other:?}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod session;

pub use error::{Error, Result};
pub use flow::{
    BrowserEvent, CompletionDetector, DetectorAction, ExternalBrowserLogin, FormError, LatchState,
    LoginForm, LoginHandoff,
};
pub use provider::Provider;
pub use session::{LoginMethod, SessionRecord};
