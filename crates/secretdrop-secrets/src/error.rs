//! Error taxonomy for secret operations.
//!
//! Messages are fixed strings or caller-facing policy text. No variant
//! carries key material, plaintext, password hashes, or store keys.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Invalid system key, malformed stored hash, or invalid settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller input violates a semantic rule. The message is safe to show.
    #[error("{0}")]
    Validation(String),

    /// Record absent, exhausted, expired earlier, or deleted.
    #[error("Secret not found")]
    NotFound,

    #[error("Invalid password")]
    InvalidPassword,

    /// The record outlived its expiry and has been deleted.
    #[error("Secret expired")]
    Expired,

    /// Integrity or format failure. Deliberately carries no detail.
    #[error("Unable to decrypt secret")]
    Decryption,

    /// Transient store failure; the caller may try again.
    #[error("Temporarily unavailable: {0}")]
    Retryable(String),
}

impl SecretError {
    /// Whether the caller may retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SecretError::Retryable(_))
    }
}

impl From<StoreError> for SecretError {
    fn from(e: StoreError) -> Self {
        SecretError::Retryable(e.to_string())
    }
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
