//! Authenticated user identity.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Profile of the logged-in user, derived from their email.
///
/// A value of this type only exists for an authenticated user, so
/// `authenticated` is always `true` for anything built by
/// [`UserIdentity::from_email`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Email address.
    pub email: String,
    /// Display name: the local part of the email.
    pub name: String,
    /// Always `true` once constructed.
    pub authenticated: bool,
}

impl UserIdentity {
    /// Derives an identity from `email`.
    ///
    /// The name is everything before the first `@`; an address without `@`
    /// uses the whole string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredential`] if the email is blank or has an
    /// empty local part.
    pub fn from_email(email: &str) -> Result<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidCredential("email is empty".into()));
        }

        let name = email.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return Err(Error::InvalidCredential(format!(
                "email {email} has no local part"
            )));
        }

        Ok(Self {
            email: email.to_string(),
            name: name.to_string(),
            authenticated: true,
        })
    }

    /// Returns `true` if a loaded identity can be trusted.
    ///
    /// Stored data is not under our control; anything that could not have
    /// come from [`UserIdentity::from_email`] is rejected.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.authenticated && !self.email.trim().is_empty() && !self.name.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_from_email() {
        let identity = UserIdentity::from_email("jan@example.com").unwrap();
        assert_eq!(
            identity,
            UserIdentity {
                email: "jan@example.com".to_string(),
                name: "jan".to_string(),
                authenticated: true,
            }
        );
        assert!(identity.is_valid());
    }

    #[test]
    fn test_from_email_without_at() {
        let identity = UserIdentity::from_email("jan").unwrap();
        assert_eq!(identity.name, "jan");
    }

    #[test]
    fn test_from_email_trims() {
        let identity = UserIdentity::from_email("  eva.novak@email.cz ").unwrap();
        assert_eq!(identity.email, "eva.novak@email.cz");
        assert_eq!(identity.name, "eva.novak");
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "   ", "@example.com"] {
            assert!(matches!(
                UserIdentity::from_email(email),
                Err(Error::InvalidCredential(_))
            ));
        }
    }

    #[test]
    fn test_stored_unauthenticated_identity_is_invalid() {
        let identity: UserIdentity = serde_json::from_str(
            r#"{"email":"jan@example.com","name":"jan","authenticated":false}"#,
        )
        .unwrap();
        assert!(!identity.is_valid());
    }
}
