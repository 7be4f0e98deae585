//! Proof issuance and verification audit trail.

use crate::StoreError;
use cadastre_types::{ChallengeNonce, OwnerAddress, ParcelId, Timestamp};
use serde::{Deserialize, Serialize};

/// A shareable proof handed out to its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedProofRecord {
    pub parcel_id: ParcelId,
    pub prover: OwnerAddress,
    pub verifier: Option<OwnerAddress>,
    pub challenge_nonce: ChallengeNonce,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// The outcome of one shareable-proof verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub parcel_id: ParcelId,
    pub prover: OwnerAddress,
    /// Network address of the party that asked for verification, when known.
    pub requested_from: Option<String>,
    pub proof_valid: bool,
    pub proof_checks_valid: bool,
    pub ledger_verified: bool,
    pub failure_reasons: Vec<String>,
    pub verified_at: Timestamp,
}

/// Append-only audit storage. Callers treat every write as best-effort.
pub trait AuditStore: Send + Sync {
    fn record_shared_proof(&self, record: &SharedProofRecord) -> Result<(), StoreError>;

    fn record_verification(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    /// Shared proofs issued by `prover`, newest first.
    fn shared_proofs_by(&self, prover: &OwnerAddress)
        -> Result<Vec<SharedProofRecord>, StoreError>;

    /// Number of recorded verifications for `(parcel_id, prover)`.
    fn verification_count(
        &self,
        parcel_id: ParcelId,
        prover: &OwnerAddress,
    ) -> Result<u64, StoreError>;
}
