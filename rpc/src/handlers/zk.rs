//! Commitments, ownership proofs and shareable proof envelopes.
//!
//! Route names keep the `zk/` prefix existing clients call, but the proofs
//! are hash commitments, not zero-knowledge proofs.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use cadastre_ledger::LedgerStatus;
use cadastre_proof::{
    compute_commitment, EnvelopeVerdict, ProofArtifact, ProofRequest, PublicSignals, ShareRequest,
    ShareableProof, VerificationReport,
};
use cadastre_registry::RegistryError;
use cadastre_types::{ChallengeNonce, Hash32, OwnerAddress, ParcelId, Salt, Timestamp};
use serde::{Deserialize, Serialize};

use super::optional_verifier;
use crate::error::{extract_json, RpcError};
use crate::extract::{ClientAddr, Session};
use crate::state::AppState;

// ── Status ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub is_ready: bool,
    pub proof_system: &'static str,
    pub max_proof_age_ms: u64,
    pub envelope_ttl_ms: u64,
    pub message: &'static str,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        is_ready: true,
        proof_system: "keccak256-commitment",
        max_proof_age_ms: state.params.max_proof_age_ms,
        envelope_ttl_ms: state.params.envelope_ttl_ms,
        message: "Ownership proof system is ready",
    })
}

// ── Commitment ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentRequest {
    pub owner_address: String,
    pub salt: String,
    pub parcel_id: ParcelId,
}

#[derive(Serialize)]
pub struct CommitmentResponse {
    pub success: bool,
    pub commitment: Hash32,
    pub message: &'static str,
}

pub async fn generate_commitment(
    body: Result<Json<CommitmentRequest>, JsonRejection>,
) -> Result<Json<CommitmentResponse>, RpcError> {
    let req = extract_json(body)?;
    let owner = OwnerAddress::parse(&req.owner_address)?;
    let salt = Salt::from_hex(&req.salt)?;
    Ok(Json(CommitmentResponse {
        success: true,
        commitment: compute_commitment(&owner, &salt, req.parcel_id),
        message: "Commitment generated successfully",
    }))
}

// ── Proof ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofRequest {
    pub parcel_id: ParcelId,
    pub challenge_nonce: Option<ChallengeNonce>,
    pub verifier_address: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofResponse {
    pub success: bool,
    pub proof: ProofArtifact,
    pub public_signals: PublicSignals,
    pub message: &'static str,
}

pub async fn generate_proof(
    State(state): State<AppState>,
    Session(session): Session,
    body: Result<Json<GenerateProofRequest>, JsonRejection>,
) -> Result<Json<GenerateProofResponse>, RpcError> {
    let req = extract_json(body)?;
    let verifier = optional_verifier(req.verifier_address.as_deref())?;
    let secret = state
        .registry
        .owner_secret(req.parcel_id, &session.address)?;
    let challenge_nonce = req
        .challenge_nonce
        .unwrap_or_else(|| ChallengeNonce::new(state.clock.now().as_millis()));

    let generated = state.engine.generate(&ProofRequest {
        owner: session.address,
        salt: &secret.salt,
        parcel_id: req.parcel_id,
        expected_commitment: secret.commitment,
        challenge_nonce,
        verifier,
    });
    state.metrics.proofs_generated.inc();
    Ok(Json(GenerateProofResponse {
        success: true,
        proof: generated.proof,
        public_signals: generated.public_signals,
        message: "Ownership proof generated successfully",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProofRequest {
    pub proof: ProofArtifact,
    pub public_signals: PublicSignals,
    pub verifier_address: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProofResponse {
    pub success: bool,
    pub is_valid: bool,
    pub message: &'static str,
    pub details: VerificationReport,
}

pub async fn verify_proof(
    State(state): State<AppState>,
    body: Result<Json<VerifyProofRequest>, JsonRejection>,
) -> Result<Json<VerifyProofResponse>, RpcError> {
    let req = extract_json(body)?;
    let verifier = optional_verifier(req.verifier_address.as_deref())?;
    let report = state
        .engine
        .verify(&req.proof, &req.public_signals, verifier.as_ref());
    state.metrics.record_verification(report.code);

    Ok(Json(VerifyProofResponse {
        success: true,
        is_valid: report.valid,
        message: if report.valid {
            "Proof is valid"
        } else {
            "Proof is invalid"
        },
        details: report,
    }))
}

// ── Ownership ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOwnershipRequest {
    pub parcel_id: ParcelId,
    pub proof: ProofArtifact,
    pub public_signals: PublicSignals,
    pub verifier_address: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOwnershipResponse {
    pub success: bool,
    pub verified: bool,
    pub zk_proof_valid: bool,
    pub blockchain_verified: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Verify a proof for one of the caller's own parcels: the proof checks plus
/// the caller's registered commitment against the ledger.
pub async fn verify_ownership(
    State(state): State<AppState>,
    Session(session): Session,
    body: Result<Json<VerifyOwnershipRequest>, JsonRejection>,
) -> Result<Json<VerifyOwnershipResponse>, RpcError> {
    let req = extract_json(body)?;
    if req.parcel_id != req.public_signals.parcel_id {
        return Err(RpcError::invalid_input(
            "parcelId does not match the proof's public signals",
        ));
    }
    let verifier = optional_verifier(req.verifier_address.as_deref())?;

    let report = state
        .engine
        .verify(&req.proof, &req.public_signals, verifier.as_ref());
    state.metrics.record_verification(report.code);
    if !report.valid {
        return Ok(Json(VerifyOwnershipResponse {
            success: true,
            verified: false,
            zk_proof_valid: false,
            blockchain_verified: false,
            message: report
                .error
                .unwrap_or_else(|| "Proof verification failed".into()),
            code: report.code,
        }));
    }

    let view = match state.registry.parcel(req.parcel_id).await {
        Ok(view) if view.owner == session.address => view,
        Ok(_) | Err(RegistryError::ParcelNotFound(_)) => {
            return Ok(Json(VerifyOwnershipResponse {
                success: true,
                verified: false,
                zk_proof_valid: true,
                blockchain_verified: false,
                message: "No ownership record found".into(),
                code: None,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    let blockchain_verified = view.ledger_status == Some(LedgerStatus::Matched)
        && view.commitment == req.public_signals.expected_commitment;
    tracing::info!(
        parcel = %req.parcel_id,
        owner = %session.address,
        verified = blockchain_verified,
        "ownership verification"
    );
    Ok(Json(VerifyOwnershipResponse {
        success: true,
        verified: blockchain_verified,
        zk_proof_valid: true,
        blockchain_verified,
        message: if blockchain_verified {
            "Ownership verified".into()
        } else {
            "Ownership verification failed".into()
        },
        code: None,
    }))
}

// ── Shareable proofs ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequestBody {
    pub parcel_id: ParcelId,
    pub message: Option<String>,
    pub verifier_address: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub success: bool,
    pub shareable_proof: ShareableProof,
    pub message: &'static str,
}

pub async fn generate_shareable_proof(
    State(state): State<AppState>,
    Session(session): Session,
    body: Result<Json<ShareRequestBody>, JsonRejection>,
) -> Result<Json<ShareResponse>, RpcError> {
    let req = extract_json(body)?;
    let verifier = optional_verifier(req.verifier_address.as_deref())?;
    let secret = state
        .registry
        .owner_secret(req.parcel_id, &session.address)?;

    let envelope = state.envelopes.create(ShareRequest {
        parcel_id: req.parcel_id,
        prover: session.address,
        salt: &secret.salt,
        expected_commitment: secret.commitment,
        challenge_nonce: None,
        verifier,
        message: req.message,
    });
    state.metrics.proofs_generated.inc();
    Ok(Json(ShareResponse {
        success: true,
        shareable_proof: envelope,
        message: "Shareable proof generated successfully",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyShareableRequest {
    pub shareable_proof: ShareableProof,
}

pub async fn verify_shareable_proof(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    body: Result<Json<VerifyShareableRequest>, JsonRejection>,
) -> Result<Json<EnvelopeVerdict>, RpcError> {
    let req = extract_json(body)?;
    let verdict = match state.envelopes.verify(&req.shareable_proof, client).await {
        Ok(verdict) => verdict,
        Err(e) => {
            state
                .metrics
                .envelope_verdicts
                .with_label_values(&[e.code()])
                .inc();
            return Err(e.into());
        }
    };
    let status = if verdict.proof_valid {
        "OWNERSHIP_VERIFIED"
    } else {
        "VERIFICATION_FAILED"
    };
    state
        .metrics
        .envelope_verdicts
        .with_label_values(&[status])
        .inc();
    Ok(Json(verdict))
}

// ── History ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedProofSummary {
    pub parcel_id: ParcelId,
    /// The bound verifier, or `"PUBLIC"`.
    pub verifier: String,
    pub challenge_nonce: ChallengeNonce,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub expired: bool,
    pub verification_count: u64,
}

#[derive(Serialize)]
pub struct MyProofsResponse {
    pub success: bool,
    pub count: usize,
    pub proofs: Vec<SharedProofSummary>,
}

pub async fn my_proofs(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<Json<MyProofsResponse>, RpcError> {
    let now = state.clock.now();
    let proofs = state
        .audit
        .shared_proofs_by(&session.address)?
        .into_iter()
        .map(|record| {
            let verification_count = state
                .audit
                .verification_count(record.parcel_id, &record.prover)?;
            Ok(SharedProofSummary {
                parcel_id: record.parcel_id,
                verifier: record
                    .verifier
                    .map_or_else(|| "PUBLIC".to_string(), |v| v.to_string()),
                challenge_nonce: record.challenge_nonce,
                created_at: record.created_at,
                expires_at: record.expires_at,
                expired: now > record.expires_at,
                verification_count,
            })
        })
        .collect::<Result<Vec<_>, RpcError>>()?;

    Ok(Json(MyProofsResponse {
        success: true,
        count: proofs.len(),
        proofs,
    }))
}
