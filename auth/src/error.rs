use cadastre_store::StoreError;
use cadastre_types::{OwnerAddress, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("no outstanding challenge for {0}")]
    IdentityNotFound(OwnerAddress),

    #[error("signature does not match the claimed address")]
    SignatureMismatch,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidInput(_) | AuthError::MalformedSignature(_) => "INVALID_INPUT",
            AuthError::IdentityNotFound(_) => "USER_NOT_FOUND",
            AuthError::SignatureMismatch => "SIGNATURE_MISMATCH",
            AuthError::Store(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token is malformed")]
    Malformed,

    #[error("session token signature is invalid")]
    BadSignature,

    #[error("session token has expired")]
    Expired,

    #[error("session token was issued for another audience")]
    WrongAudience,

    #[error("session secret must not be empty")]
    InvalidSecret,

    #[error("session claims could not be encoded: {0}")]
    Encoding(String),
}
