use cadastre_types::OwnerAddress;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why an ownership proof was rejected. Checks run in a fixed order and the
/// first failing check is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyFailure {
    #[error("Verifier required for bound proof")]
    VerifierRequired,

    #[error("Proof is bound to different verifier")]
    WrongVerifier {
        intended: OwnerAddress,
        requesting: OwnerAddress,
    },

    #[error("Proof expired (older than {max_age_hours} hours)")]
    ProofExpired { age_ms: u64, max_age_hours: u64 },

    #[error("Invalid proof structure: {0}")]
    MalformedProof(String),

    #[error("Parcel ID in proof doesn't match public signals")]
    ParcelIdMismatch { in_proof: String, expected: String },

    #[error("Challenge nonce mismatch - possible replay attack")]
    NonceMismatch { in_proof: String, expected: String },

    #[error("Verifier binding mismatch in proof")]
    VerifierBindingMismatch { in_proof: String, expected: String },

    #[error("Commitment hash doesn't match expected value")]
    CommitmentHashMismatch,

    #[error("Proof signature is invalid or missing")]
    InvalidSignatureFormat,
}

impl VerifyFailure {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            VerifyFailure::VerifierRequired => "VERIFIER_REQUIRED",
            VerifyFailure::WrongVerifier { .. } => "WRONG_VERIFIER",
            VerifyFailure::ProofExpired { .. } => "PROOF_EXPIRED",
            VerifyFailure::MalformedProof(_) => "MALFORMED_PROOF",
            VerifyFailure::ParcelIdMismatch { .. } => "PARCEL_ID_MISMATCH",
            VerifyFailure::NonceMismatch { .. } => "NONCE_MISMATCH",
            VerifyFailure::VerifierBindingMismatch { .. } => "VERIFIER_BINDING_MISMATCH",
            VerifyFailure::CommitmentHashMismatch => "COMMITMENT_HASH_MISMATCH",
            VerifyFailure::InvalidSignatureFormat => "INVALID_SIGNATURE_FORMAT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Proof has expired")]
    Expired { expired_at: DateTime<Utc> },
}

impl EnvelopeError {
    pub fn code(&self) -> &'static str {
        match self {
            EnvelopeError::Expired { .. } => "ENVELOPE_EXPIRED",
        }
    }
}
