//! Input validation errors shared across crates.

use thiserror::Error;

/// Raised when a caller-supplied value cannot be turned into one of the
/// strongly typed values in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("invalid owner address: {0}")]
    InvalidAddress(String),

    #[error("invalid 32-byte hash: {0}")]
    InvalidHash(String),

    #[error("invalid salt: {0}")]
    InvalidSalt(String),

    #[error("invalid parcel id: {0}")]
    InvalidParcelId(String),

    #[error("invalid challenge nonce: {0}")]
    InvalidNonce(String),
}
