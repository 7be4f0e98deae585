//! Ownership transfer requests (owners) and decisions (authorities).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cadastre_store::{TransferRecord, TransferStatus};
use cadastre_types::{OwnerAddress, ParcelId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{extract_json, RpcError};
use crate::extract::{Authority, Session};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferView {
    pub id: Uuid,
    pub parcel_id: ParcelId,
    pub from_address: OwnerAddress,
    pub to_address: OwnerAddress,
    pub reason: Option<String>,
    pub status: TransferStatus,
    pub requested_at: Timestamp,
    pub decided_at: Option<Timestamp>,
    pub decided_by: Option<OwnerAddress>,
    pub notes: Option<String>,
}

impl From<TransferRecord> for TransferView {
    fn from(r: TransferRecord) -> Self {
        Self {
            id: r.id,
            parcel_id: r.parcel_id,
            from_address: r.from,
            to_address: r.to,
            reason: r.reason,
            status: r.status,
            requested_at: r.requested_at,
            decided_at: r.decided_at,
            decided_by: r.decided_by,
            notes: r.notes,
        }
    }
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub success: bool,
    pub transfer: TransferView,
    pub message: &'static str,
}

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequestBody {
    pub parcel_id: ParcelId,
    pub to_address: String,
    pub reason: Option<String>,
}

pub async fn request(
    State(state): State<AppState>,
    Session(session): Session,
    body: Result<Json<TransferRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<TransferResponse>), RpcError> {
    let req = extract_json(body)?;
    let to = OwnerAddress::parse(&req.to_address)?;
    let record =
        state
            .registry
            .request_transfer(session.address, req.parcel_id, to, req.reason)?;
    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            success: true,
            transfer: record.into(),
            message: "Transfer request submitted successfully",
        }),
    ))
}

// ── Decisions ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PendingResponse {
    pub success: bool,
    pub count: usize,
    pub transfers: Vec<TransferView>,
}

pub async fn pending(
    State(state): State<AppState>,
    Authority(_): Authority,
) -> Result<Json<PendingResponse>, RpcError> {
    let transfers: Vec<TransferView> = state
        .registry
        .pending_transfers()?
        .into_iter()
        .map(TransferView::from)
        .collect();
    Ok(Json(PendingResponse {
        success: true,
        count: transfers.len(),
        transfers,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub transfer_id: Uuid,
    pub notes: Option<String>,
}

pub async fn approve(
    State(state): State<AppState>,
    Authority(authority): Authority,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, RpcError> {
    let req = extract_json(body)?;
    let record = state
        .registry
        .approve_transfer(req.transfer_id, authority.address, req.notes)
        .await?;
    Ok(Json(TransferResponse {
        success: true,
        transfer: record.into(),
        message: "Transfer approved",
    }))
}

pub async fn reject(
    State(state): State<AppState>,
    Authority(authority): Authority,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, RpcError> {
    let req = extract_json(body)?;
    let record = state
        .registry
        .reject_transfer(req.transfer_id, authority.address, req.notes)?;
    Ok(Json(TransferResponse {
        success: true,
        transfer: record.into(),
        message: "Transfer rejected",
    }))
}
