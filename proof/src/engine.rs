//! Ownership proof generation and verification.
//!
//! Generation binds the owner, parcel, salt, verifier and challenge nonce into
//! an input hash, binds the expected commitment to the parcel, and seals both
//! with the generation time:
//!
//! ```text
//! inputHash  = K(owner:address ‖ parcelId:uint256 ‖ salt:bytes32 ‖ verifierOrZero:address ‖ nonce:uint256)
//! commitHash = K(expectedCommitment:bytes32 ‖ parcelId:uint256)
//! signature  = K(inputHash:bytes32 ‖ commitHash:bytes32 ‖ timestampMs:uint256)
//! ```
//!
//! One timestamp is taken per generation and used for `pi_a[1]`,
//! `publicSignals.timestamp` and the signature.

use std::sync::Arc;

use cadastre_crypto::{uint_to_decimal, Packed};
use cadastre_types::{
    ChallengeNonce, Clock, Hash32, OwnerAddress, ParcelId, ProtocolParams, Salt, Timestamp,
};
use serde::Serialize;

use crate::artifact::{OwnershipProof, ProofArtifact, ProofKind, PublicSignals};
use crate::error::VerifyFailure;
use crate::error::VerifyFailure::*;

/// Inputs to [`OwnershipProofEngine::generate`].
pub struct ProofRequest<'a> {
    pub owner: OwnerAddress,
    pub salt: &'a Salt,
    pub parcel_id: ParcelId,
    pub expected_commitment: Hash32,
    pub challenge_nonce: ChallengeNonce,
    /// `None` (or the zero address) produces a public proof.
    pub verifier: Option<OwnerAddress>,
}

/// Which verification checks passed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSet {
    pub structure: bool,
    pub parcel_id: bool,
    pub nonce: bool,
    pub verifier_binding: bool,
    pub commitment: bool,
    pub signature: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub is_public: bool,
    /// The requesting verifier, or `"PUBLIC"`.
    pub verifier: String,
    pub timestamp: Timestamp,
    pub verified: CheckSet,
    #[serde(skip)]
    pub failure: Option<VerifyFailure>,
}

pub struct OwnershipProofEngine {
    clock: Arc<dyn Clock>,
    max_proof_age_ms: u64,
}

impl OwnershipProofEngine {
    pub fn new(clock: Arc<dyn Clock>, params: &ProtocolParams) -> Self {
        Self {
            clock,
            max_proof_age_ms: params.max_proof_age_ms,
        }
    }

    /// `K(expectedCommitment ‖ parcelId)`
    pub fn commitment_verification_hash(expected: &Hash32, parcel_id: ParcelId) -> Hash32 {
        Packed::new().hash(expected).parcel(parcel_id).keccak()
    }

    pub fn generate(&self, req: &ProofRequest<'_>) -> OwnershipProof {
        let verifier = req.verifier.filter(|v| !v.is_zero());
        let kind = match verifier {
            None => ProofKind::Public,
            Some(_) => ProofKind::VerifierBound,
        };
        let now = self.clock.now();

        let input_hash = Packed::new()
            .address(&req.owner)
            .parcel(req.parcel_id)
            .salt(req.salt)
            .address(&verifier.unwrap_or(OwnerAddress::ZERO))
            .nonce(req.challenge_nonce)
            .keccak();
        let commitment_hash =
            Self::commitment_verification_hash(&req.expected_commitment, req.parcel_id);
        let signature = Packed::new()
            .hash(&input_hash)
            .hash(&commitment_hash)
            .uint256(now.as_millis())
            .keccak();

        let proof = ProofArtifact {
            pi_a: vec![input_hash.to_string(), now.as_millis().to_string()],
            pi_b: vec![vec![
                req.parcel_id.to_string(),
                req.challenge_nonce.to_string(),
            ]],
            pi_c: vec![verifier_decimal(verifier.as_ref())],
            proof_type: Some(kind),
            proof_signature: Some(signature.to_string()),
        };
        let public_signals = PublicSignals {
            parcel_id: req.parcel_id,
            expected_commitment: req.expected_commitment,
            challenge_nonce: req.challenge_nonce,
            verifier_address: verifier,
            timestamp: now,
            is_public: verifier.is_none(),
            commitment_hash: Some(commitment_hash),
        };

        tracing::info!(
            parcel = %req.parcel_id,
            kind = ?kind,
            "ownership proof generated"
        );
        OwnershipProof {
            proof,
            public_signals,
        }
    }

    /// Verify a proof against its public signals, on behalf of
    /// `requesting_verifier` (required for verifier-bound proofs).
    ///
    /// Checks run fail-fast in this order: verifier binding, freshness,
    /// structure, cross-field consistency (parcel id, nonce, verifier),
    /// commitment hash, signature format.
    pub fn verify(
        &self,
        proof: &ProofArtifact,
        signals: &PublicSignals,
        requesting_verifier: Option<&OwnerAddress>,
    ) -> VerificationReport {
        let is_public = signals.derived_is_public();
        if signals.is_public != is_public {
            tracing::warn!(
                parcel = %signals.parcel_id,
                flag = signals.is_public,
                derived = is_public,
                "isPublic flag disagrees with verifierAddress; using verifierAddress"
            );
        }

        let mut checks = CheckSet::default();
        let outcome = self.run_checks(proof, signals, requesting_verifier, &mut checks);

        let verifier = requesting_verifier
            .map(ToString::to_string)
            .unwrap_or_else(|| "PUBLIC".to_owned());
        match outcome {
            Ok(()) => {
                tracing::info!(parcel = %signals.parcel_id, public = is_public, "ownership proof verified");
                VerificationReport {
                    valid: true,
                    error: None,
                    code: None,
                    is_public,
                    verifier,
                    timestamp: signals.timestamp,
                    verified: checks,
                    failure: None,
                }
            }
            Err(failure) => {
                tracing::warn!(
                    parcel = %signals.parcel_id,
                    code = failure.code(),
                    "ownership proof rejected: {failure}"
                );
                VerificationReport {
                    valid: false,
                    error: Some(failure.to_string()),
                    code: Some(failure.code()),
                    is_public,
                    verifier,
                    timestamp: signals.timestamp,
                    verified: checks,
                    failure: Some(failure),
                }
            }
        }
    }

    fn run_checks(
        &self,
        proof: &ProofArtifact,
        signals: &PublicSignals,
        requesting_verifier: Option<&OwnerAddress>,
        checks: &mut CheckSet,
    ) -> Result<(), VerifyFailure> {
        if let Some(bound) = signals.verifier_address {
            match requesting_verifier {
                None => return Err(VerifierRequired),
                Some(requesting) if *requesting != bound => {
                    return Err(WrongVerifier {
                        intended: bound,
                        requesting: *requesting,
                    })
                }
                Some(_) => {}
            }
        }

        let age_ms = signals.timestamp.elapsed_since(self.clock.now());
        if age_ms > self.max_proof_age_ms {
            return Err(ProofExpired {
                age_ms,
                max_age_hours: self.max_proof_age_ms / 3_600_000,
            });
        }

        let parsed = proof.parse()?;
        checks.structure = true;

        let expected_parcel = signals.parcel_id.to_string();
        if parsed.claimed_parcel_id != expected_parcel {
            return Err(ParcelIdMismatch {
                in_proof: parsed.claimed_parcel_id,
                expected: expected_parcel,
            });
        }
        checks.parcel_id = true;

        let expected_nonce = signals.challenge_nonce.to_string();
        if parsed.claimed_nonce != expected_nonce {
            return Err(NonceMismatch {
                in_proof: parsed.claimed_nonce,
                expected: expected_nonce,
            });
        }
        checks.nonce = true;

        let expected_verifier = verifier_decimal(signals.verifier_address.as_ref());
        if parsed.claimed_verifier != expected_verifier {
            return Err(VerifierBindingMismatch {
                in_proof: parsed.claimed_verifier,
                expected: expected_verifier,
            });
        }
        checks.verifier_binding = true;

        let commitment_hash =
            Self::commitment_verification_hash(&signals.expected_commitment, signals.parcel_id);
        if signals.commitment_hash != Some(commitment_hash) {
            return Err(CommitmentHashMismatch);
        }
        checks.commitment = true;

        match parsed.signature.as_deref() {
            Some(sig) if is_hash_hex(sig) => {}
            _ => return Err(InvalidSignatureFormat),
        }
        checks.signature = true;

        tracing::debug!(parcel = %signals.parcel_id, ?checks, "all proof checks passed");
        Ok(())
    }
}

/// The verifier as a decimal `uint160`, or `"0"` for public proofs.
fn verifier_decimal(verifier: Option<&OwnerAddress>) -> String {
    verifier
        .map(|v| uint_to_decimal(v.as_bytes()))
        .unwrap_or_else(|| "0".to_owned())
}

/// `0x` followed by exactly 64 hex digits.
fn is_hash_hex(s: &str) -> bool {
    s.len() == 66
        && s.starts_with("0x")
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}
