//! Shareable, self-describing ownership proofs.
//!
//! An envelope wraps an [`OwnershipProof`] with the claim it supports (parcel,
//! prover, commitment) and a 24h expiry. Verifying an envelope runs the proof
//! checks and independently compares the claimed commitment with the ledger;
//! both outcomes are reported side by side.

use std::sync::Arc;

use cadastre_ledger::{verify_parcel_commitment, CommitmentLedger, LedgerStatus};
use cadastre_store::{AuditStore, SharedProofRecord, VerificationRecord};
use cadastre_types::{
    ChallengeNonce, Clock, Hash32, OwnerAddress, ParcelId, ProtocolParams, Salt, Timestamp,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::OwnershipProof;
use crate::engine::{CheckSet, OwnershipProofEngine, ProofRequest};
use crate::error::EnvelopeError;

pub const ENVELOPE_VERSION: &str = "1.0";
pub const ENVELOPE_TYPE: &str = "LAND_OWNERSHIP_PROOF";
pub const DEFAULT_VERIFY_ENDPOINT: &str = "/api/zk/verify-shareable-proof";

const ENVELOPE_MISMATCH: &str = "Envelope fields do not match the enclosed proof";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationInstructions {
    pub endpoint: String,
    pub method: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareableProof {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parcel_id: ParcelId,
    pub prover: OwnerAddress,
    /// `None` travels as `"PUBLIC"`.
    #[serde(with = "envelope_verifier")]
    pub verifier: Option<OwnerAddress>,
    pub message: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub challenge_nonce: ChallengeNonce,
    pub commitment: Hash32,
    pub zk_proof: OwnershipProof,
    pub verification_instructions: VerificationInstructions,
}

/// Inputs to [`ShareableProofService::create`].
pub struct ShareRequest<'a> {
    pub parcel_id: ParcelId,
    pub prover: OwnerAddress,
    pub salt: &'a Salt,
    pub expected_commitment: Hash32,
    /// Defaults to the current time in milliseconds.
    pub challenge_nonce: Option<ChallengeNonce>,
    pub verifier: Option<OwnerAddress>,
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    OwnershipVerified,
    VerificationFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainData {
    /// What the ledger holds, if anything could be read.
    pub commitment: Option<Hash32>,
    pub expected_commitment: Hash32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeVerdict {
    pub success: bool,
    pub proof_valid: bool,
    pub zk_proof_valid: bool,
    pub blockchain_verified: bool,
    pub ledger_status: LedgerStatus,
    pub parcel_id: ParcelId,
    pub prover: OwnerAddress,
    pub message: String,
    pub generated_at: DateTime<Utc>,
    pub verified_at: DateTime<Utc>,
    pub verified: CheckSet,
    pub blockchain_data: BlockchainData,
    pub status: VerdictStatus,
    pub failure_reasons: Vec<String>,
}

pub struct ShareableProofService {
    engine: Arc<OwnershipProofEngine>,
    ledger: Arc<dyn CommitmentLedger>,
    audit: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    envelope_ttl_ms: u64,
    endpoint: String,
}

impl ShareableProofService {
    pub fn new(
        engine: Arc<OwnershipProofEngine>,
        ledger: Arc<dyn CommitmentLedger>,
        audit: Arc<dyn AuditStore>,
        clock: Arc<dyn Clock>,
        params: &ProtocolParams,
    ) -> Self {
        Self {
            engine,
            ledger,
            audit,
            clock,
            envelope_ttl_ms: params.envelope_ttl_ms,
            endpoint: DEFAULT_VERIFY_ENDPOINT.to_owned(),
        }
    }

    /// Override the endpoint advertised in `verificationInstructions`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn create(&self, req: ShareRequest<'_>) -> ShareableProof {
        let verifier = req.verifier.filter(|v| !v.is_zero());
        let challenge_nonce = req
            .challenge_nonce
            .unwrap_or_else(|| ChallengeNonce::new(self.clock.now().as_millis()));

        let zk_proof = self.engine.generate(&ProofRequest {
            owner: req.prover,
            salt: req.salt,
            parcel_id: req.parcel_id,
            expected_commitment: req.expected_commitment,
            challenge_nonce,
            verifier,
        });
        let generated = zk_proof.public_signals.timestamp;
        let expires = generated.plus_millis(self.envelope_ttl_ms);

        let record = SharedProofRecord {
            parcel_id: req.parcel_id,
            prover: req.prover,
            verifier,
            challenge_nonce,
            created_at: generated,
            expires_at: expires,
        };
        if let Err(e) = self.audit.record_shared_proof(&record) {
            tracing::warn!(parcel = %req.parcel_id, error = %e, "failed to record shared proof");
        }

        tracing::info!(
            parcel = %req.parcel_id,
            prover = %req.prover,
            public = verifier.is_none(),
            "shareable proof created"
        );
        ShareableProof {
            version: ENVELOPE_VERSION.to_owned(),
            kind: ENVELOPE_TYPE.to_owned(),
            parcel_id: req.parcel_id,
            prover: req.prover,
            verifier,
            message: req
                .message
                .unwrap_or_else(|| format!("Ownership proof for Parcel {}", req.parcel_id)),
            generated_at: to_datetime(generated),
            expires_at: to_datetime(expires),
            challenge_nonce,
            commitment: req.expected_commitment,
            zk_proof,
            verification_instructions: VerificationInstructions {
                endpoint: self.endpoint.clone(),
                method: "POST".to_owned(),
                description: "Send this entire proof object to verify land ownership".to_owned(),
            },
        }
    }

    /// Verify an envelope on behalf of `requested_from` (recorded in the audit
    /// trail only).
    ///
    /// An expired envelope is rejected outright. Otherwise a verdict is always
    /// returned; proof and ledger failures are both listed in
    /// `failure_reasons`.
    pub async fn verify(
        &self,
        envelope: &ShareableProof,
        requested_from: Option<String>,
    ) -> Result<EnvelopeVerdict, EnvelopeError> {
        let now = self.clock.now();
        let verified_at = to_datetime(now);
        if verified_at > envelope.expires_at {
            tracing::warn!(parcel = %envelope.parcel_id, expired_at = %envelope.expires_at, "expired envelope rejected");
            return Err(EnvelopeError::Expired {
                expired_at: envelope.expires_at,
            });
        }

        let signals = &envelope.zk_proof.public_signals;
        let report = self
            .engine
            .verify(&envelope.zk_proof.proof, signals, envelope.verifier.as_ref());

        let mut failure_reasons = Vec::new();
        let mut zk_proof_valid = report.valid;
        if let Some(error) = &report.error {
            failure_reasons.push(error.clone());
        }
        if !envelope_matches_proof(envelope) {
            zk_proof_valid = false;
            failure_reasons.push(ENVELOPE_MISMATCH.to_owned());
        }

        let check =
            verify_parcel_commitment(self.ledger.as_ref(), envelope.parcel_id, envelope.commitment)
                .await;
        let blockchain_verified = check.is_valid();
        if !blockchain_verified {
            failure_reasons.push(check.reason.clone());
        }

        let proof_valid = zk_proof_valid && blockchain_verified;
        let (status, message) = if proof_valid {
            (VerdictStatus::OwnershipVerified, "Land ownership verified successfully")
        } else {
            (VerdictStatus::VerificationFailed, "Land ownership verification failed")
        };

        let record = VerificationRecord {
            parcel_id: envelope.parcel_id,
            prover: envelope.prover,
            requested_from,
            proof_valid,
            proof_checks_valid: zk_proof_valid,
            ledger_verified: blockchain_verified,
            failure_reasons: failure_reasons.clone(),
            verified_at: now,
        };
        if let Err(e) = self.audit.record_verification(&record) {
            tracing::warn!(parcel = %envelope.parcel_id, error = %e, "failed to record verification");
        }

        tracing::info!(
            parcel = %envelope.parcel_id,
            proof_valid,
            zk_proof_valid,
            ledger = ?check.status,
            "shareable proof verified"
        );
        Ok(EnvelopeVerdict {
            success: true,
            proof_valid,
            zk_proof_valid,
            blockchain_verified,
            ledger_status: check.status,
            parcel_id: envelope.parcel_id,
            prover: envelope.prover,
            message: message.to_owned(),
            generated_at: envelope.generated_at,
            verified_at,
            verified: report.verified,
            blockchain_data: BlockchainData {
                commitment: check.ledger_commitment,
                expected_commitment: envelope.commitment,
            },
            status,
            failure_reasons,
        })
    }
}

/// The envelope's outer claim must be the one its proof was generated for.
fn envelope_matches_proof(envelope: &ShareableProof) -> bool {
    let signals = &envelope.zk_proof.public_signals;
    envelope.parcel_id == signals.parcel_id
        && envelope.commitment == signals.expected_commitment
        && envelope.challenge_nonce == signals.challenge_nonce
        && envelope.verifier == signals.verifier_address
}

fn to_datetime(ts: Timestamp) -> DateTime<Utc> {
    i64::try_from(ts.as_millis())
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_default()
}

mod envelope_verifier {
    use cadastre_types::OwnerAddress;
    use serde::{Deserialize, Deserializer, Serializer};

    const PUBLIC: &str = "PUBLIC";

    pub fn serialize<S: Serializer>(v: &Option<OwnerAddress>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(addr) => s.collect_str(addr),
            None => s.serialize_str(PUBLIC),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OwnerAddress>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.trim().eq_ignore_ascii_case(PUBLIC) {
            return Ok(None);
        }
        crate::artifact::verifier_field::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadastre_ledger::TimedLedger;
    use cadastre_nullables::{LedgerFault, NullClock, NullLedger, NullStore};
    use cadastre_types::params::HOUR_MS;
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000_000;

    struct Harness {
        clock: Arc<NullClock>,
        ledger: Arc<NullLedger>,
        store: Arc<NullStore>,
        service: ShareableProofService,
        salt: Salt,
        commitment: Hash32,
    }

    fn parcel() -> ParcelId {
        ParcelId::new(7).unwrap()
    }

    fn prover() -> OwnerAddress {
        OwnerAddress::new([0xAA; 20])
    }

    fn verifier() -> OwnerAddress {
        OwnerAddress::new([0xBB; 20])
    }

    async fn harness() -> Harness {
        let clock = Arc::new(NullClock::new(NOW));
        let ledger = Arc::new(NullLedger::new());
        let store = Arc::new(NullStore::new());
        let params = ProtocolParams::default();
        let engine = Arc::new(OwnershipProofEngine::new(clock.clone(), &params));
        let service = ShareableProofService::new(
            engine,
            ledger.clone(),
            store.clone(),
            clock.clone(),
            &params,
        );
        let salt = Salt::new([0x5A; 32]);
        let commitment = crate::compute_commitment(&prover(), &salt, parcel());
        ledger
            .register_commitment(parcel(), prover(), commitment)
            .await
            .unwrap();
        Harness {
            clock,
            ledger,
            store,
            service,
            salt,
            commitment,
        }
    }

    fn share(h: &Harness, verifier: Option<OwnerAddress>) -> ShareableProof {
        h.service.create(ShareRequest {
            parcel_id: parcel(),
            prover: prover(),
            salt: &h.salt,
            expected_commitment: h.commitment,
            challenge_nonce: None,
            verifier,
            message: None,
        })
    }

    #[tokio::test]
    async fn create_fills_defaults() {
        let h = harness().await;
        let env = share(&h, None);
        assert_eq!(env.version, "1.0");
        assert_eq!(env.kind, "LAND_OWNERSHIP_PROOF");
        assert_eq!(env.message, "Ownership proof for Parcel 7");
        assert_eq!(env.challenge_nonce, ChallengeNonce::new(NOW));
        assert_eq!(
            (env.expires_at - env.generated_at).num_milliseconds(),
            24 * HOUR_MS as i64
        );
        assert_eq!(env.verification_instructions.method, "POST");
        assert_eq!(h.store.shared_proofs_by(&prover()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wire_shape() {
        let h = harness().await;
        let json = serde_json::to_value(share(&h, None)).unwrap();
        assert_eq!(json["type"], "LAND_OWNERSHIP_PROOF");
        assert_eq!(json["verifier"], "PUBLIC");
        assert_eq!(json["parcelId"], "7");
        assert!(json["zkProof"]["proof"]["pi_a"].is_array());
        assert!(json["zkProof"]["publicSignals"]["commitmentHash"].is_string());
        assert!(json["verificationInstructions"]["endpoint"].is_string());

        let back: ShareableProof = serde_json::from_value(json).unwrap();
        assert_eq!(back.verifier, None);
    }

    #[tokio::test]
    async fn valid_envelope_is_verified() {
        let h = harness().await;
        let env = share(&h, None);
        let verdict = h.service.verify(&env, Some("10.0.0.1".into())).await.unwrap();
        assert!(verdict.proof_valid);
        assert!(verdict.zk_proof_valid);
        assert!(verdict.blockchain_verified);
        assert_eq!(verdict.ledger_status, LedgerStatus::Matched);
        assert_eq!(verdict.status, VerdictStatus::OwnershipVerified);
        assert!(verdict.failure_reasons.is_empty());
        assert_eq!(verdict.blockchain_data.commitment, Some(h.commitment));

        let records = h.store.verification_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].requested_from.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn verifier_bound_envelope_uses_its_verifier() {
        let h = harness().await;
        let env = share(&h, Some(verifier()));
        let verdict = h.service.verify(&env, None).await.unwrap();
        assert!(verdict.proof_valid, "{:?}", verdict.failure_reasons);
    }

    #[tokio::test]
    async fn ledger_mismatch_keeps_proof_checks_valid() {
        let h = harness().await;
        let env = share(&h, None);
        h.ledger
            .transfer_commitment(parcel(), verifier(), Hash32::new([0x01; 32]))
            .await
            .unwrap();

        let verdict = h.service.verify(&env, None).await.unwrap();
        assert!(!verdict.proof_valid);
        assert!(verdict.zk_proof_valid);
        assert!(!verdict.blockchain_verified);
        assert_eq!(verdict.ledger_status, LedgerStatus::Mismatch);
        assert_eq!(verdict.status, VerdictStatus::VerificationFailed);
        assert!(!verdict.failure_reasons.is_empty());
    }

    #[tokio::test]
    async fn unregistered_parcel_reports_not_found() {
        let h = harness().await;
        let other = ParcelId::new(8).unwrap();
        let env = h.service.create(ShareRequest {
            parcel_id: other,
            prover: prover(),
            salt: &h.salt,
            expected_commitment: crate::compute_commitment(&prover(), &h.salt, other),
            challenge_nonce: Some(ChallengeNonce::new(1)),
            verifier: None,
            message: Some("custom".into()),
        });
        assert_eq!(env.message, "custom");
        let verdict = h.service.verify(&env, None).await.unwrap();
        assert_eq!(verdict.ledger_status, LedgerStatus::NotFound);
        assert!(verdict.zk_proof_valid);
        assert!(!verdict.proof_valid);
    }

    #[tokio::test]
    async fn expired_envelope_is_rejected_first() {
        let h = harness().await;
        let mut env = share(&h, None);
        env.zk_proof.proof.pi_c.clear();
        h.clock.advance(24 * HOUR_MS + 1);
        let err = h.service.verify(&env, None).await.unwrap_err();
        assert_eq!(err.code(), "ENVELOPE_EXPIRED");
        assert!(h.store.verification_records().is_empty());
    }

    #[tokio::test]
    async fn envelope_at_expiry_instant_still_verifies() {
        let h = harness().await;
        let env = share(&h, None);
        h.clock.advance(24 * HOUR_MS);
        let verdict = h.service.verify(&env, None).await.unwrap();
        assert!(verdict.proof_valid, "{:?}", verdict.failure_reasons);
    }

    #[tokio::test]
    async fn both_failures_are_reported() {
        let h = harness().await;
        let mut env = share(&h, None);
        env.zk_proof.proof.pi_b[0][1] = "999".into();
        h.ledger.set_fault(LedgerFault::Unavailable);

        let verdict = h.service.verify(&env, None).await.unwrap();
        assert!(!verdict.zk_proof_valid);
        assert!(!verdict.blockchain_verified);
        assert_eq!(verdict.ledger_status, LedgerStatus::Unavailable);
        assert_eq!(verdict.failure_reasons.len(), 2);
        assert!(verdict.failure_reasons[0].contains("nonce"));
        assert!(verdict.failure_reasons[1].starts_with("Ledger unavailable"));
    }

    #[tokio::test]
    async fn swapped_envelope_commitment_is_caught() {
        let h = harness().await;
        let mut env = share(&h, None);
        env.commitment = Hash32::new([0x77; 32]);
        let verdict = h.service.verify(&env, None).await.unwrap();
        assert!(!verdict.zk_proof_valid);
        assert!(verdict
            .failure_reasons
            .iter()
            .any(|r| r == ENVELOPE_MISMATCH));
    }

    #[tokio::test]
    async fn audit_failure_is_swallowed() {
        let h = harness().await;
        let env = share(&h, None);
        h.store.set_audit_failure(true);
        let verdict = h.service.verify(&env, None).await.unwrap();
        assert!(verdict.proof_valid);
    }

    #[tokio::test]
    async fn stalled_ledger_times_out_as_unavailable() {
        let clock = Arc::new(NullClock::new(NOW));
        let inner = NullLedger::new();
        inner.set_fault(LedgerFault::Delay(Duration::from_secs(5)));
        let ledger = Arc::new(TimedLedger::new(inner, Duration::from_millis(20)));
        let store = Arc::new(NullStore::new());
        let params = ProtocolParams::default();
        let service = ShareableProofService::new(
            Arc::new(OwnershipProofEngine::new(clock.clone(), &params)),
            ledger.clone(),
            store,
            clock,
            &params,
        );
        let salt = Salt::new([0x01; 32]);
        let env = service.create(ShareRequest {
            parcel_id: parcel(),
            prover: prover(),
            salt: &salt,
            expected_commitment: crate::compute_commitment(&prover(), &salt, parcel()),
            challenge_nonce: None,
            verifier: None,
            message: None,
        });

        let verdict = service.verify(&env, None).await.unwrap();
        assert_eq!(verdict.ledger_status, LedgerStatus::Unavailable);
        assert_eq!(ledger.timeouts(), 1);
    }
}
