//! # Key Errors

use thiserror::Error;
use uuid::Uuid;

/// Result type for key vault operations
pub type KeyResult<T> = Result<T, KeyError>;

/// Key vault errors
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    /// No data key with this id exists in the vault
    #[error("data key {0} not found")]
    NotFound(Uuid),

    /// The wrapped material could not be decrypted with the master key
    #[error("failed to unwrap data key {0}")]
    Unwrap(Uuid),

    /// A fresh data key could not be wrapped
    #[error("failed to mint data key '{0}'")]
    Mint(String),

    /// The master secret is unusable
    #[error("invalid master secret: {0}")]
    InvalidSecret(String),

    /// The backing store failed
    #[error("key store error: {0}")]
    Store(String),
}

impl KeyError {
    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        KeyError::Store(err.to_string())
    }
}
