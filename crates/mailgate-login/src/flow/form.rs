//! Login form shown before the browser surface.

/// Reason a login form cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// Email field is empty.
    #[error("Email is required")]
    EmptyEmail,
    /// Password field is empty.
    #[error("Password is required")]
    EmptyPassword,
}

/// Credentials typed by the user.
///
/// The password never leaves this form; the provider checks it inside the
/// browser surface.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl LoginForm {
    /// Creates a form from typed values.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks that both fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns the first missing field.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.email.trim().is_empty() {
            return Err(FormError::EmptyEmail);
        }
        if self.password.is_empty() {
            return Err(FormError::EmptyPassword);
        }
        Ok(())
    }

    /// Email to log in once the provider reports success.
    ///
    /// Falls back to `fallback` when the field was left empty, which happens
    /// when the user goes straight to the provider's web login.
    #[must_use]
    pub fn handoff_email(&self, fallback: Option<&str>) -> String {
        let email = self.email.trim();
        if email.is_empty() {
            fallback.unwrap_or_default().to_string()
        } else {
            email.to_string()
        }
    }
}
