use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signer could not be recovered from signature")]
    RecoveryFailed,

    #[error("invalid secret key")]
    InvalidKey,

    #[error("signing failed")]
    SigningFailed,

    #[error("sealed salt could not be opened")]
    Decryption,
}
