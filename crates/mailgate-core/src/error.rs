//! Error types for the core library.

use thiserror::Error;

pub use crate::store::StorageError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Durable store operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Email passed to login is empty or malformed.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Another login or logout is still running.
    #[error("Another login or logout is already in progress")]
    Busy,
}

impl Error {
    /// Returns `true` for [`Error::Busy`], which callers should ignore.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
