//! Wallet login: nonce challenge, then a signature over it for a session.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use cadastre_auth::AuthenticatedIdentity;
use cadastre_types::{ChallengeNonce, OwnerAddress, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{extract_json, RpcError};
use crate::state::AppState;

// ── Nonce ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NonceRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct NonceResponse {
    pub success: bool,
    pub nonce: ChallengeNonce,
    pub message: String,
}

pub async fn request_nonce(
    State(state): State<AppState>,
    body: Result<Json<NonceRequest>, JsonRejection>,
) -> Result<Json<NonceResponse>, RpcError> {
    let req = extract_json(body)?;
    let address = OwnerAddress::parse(&req.address)?;
    let challenge = state.authenticator.issue_challenge(&address)?;
    state.metrics.challenges_issued.inc();
    Ok(Json(NonceResponse {
        success: true,
        nonce: challenge.nonce,
        message: challenge.message,
    }))
}

// ── Signature ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifySignatureRequest {
    pub address: String,
    pub signature: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: Timestamp,
    pub user: AuthenticatedIdentity,
    pub message: String,
}

pub async fn verify_signature(
    State(state): State<AppState>,
    body: Result<Json<VerifySignatureRequest>, JsonRejection>,
) -> Result<Json<VerifySignatureResponse>, RpcError> {
    let req = extract_json(body)?;
    let address = OwnerAddress::parse(&req.address)?;

    let user = match state.authenticator.verify_challenge(&address, &req.signature) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(address = %address, code = e.code(), "login rejected");
            state
                .metrics
                .authentications
                .with_label_values(&[e.code()])
                .inc();
            return Err(e.into());
        }
    };
    state
        .metrics
        .authentications
        .with_label_values(&["success"])
        .inc();

    let session = state.sessions.issue(&user)?;
    Ok(Json(VerifySignatureResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at,
        user,
        message: "Authentication successful".into(),
    }))
}
