//! Error types for login operations.

use crate::flow::FormError;

/// Result type alias for login operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Login error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The receiving side rejected a detected login.
    #[error("Login handoff failed: {0}")]
    HandoffFailure(String),

    /// Login form is incomplete.
    #[error("Invalid login form: {0}")]
    InvalidForm(#[from] FormError),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid provider configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Creates a handoff failure from any displayable error.
    #[must_use]
    pub fn handoff(err: impl std::fmt::Display) -> Self {
        Self::HandoffFailure(err.to_string())
    }
}
