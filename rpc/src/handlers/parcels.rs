//! Parcel registration and lookup.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cadastre_ledger::{CommitmentLedger, LedgerEntry};
use cadastre_registry::{ParcelView, RegisteredParcel};
use cadastre_types::{OwnerAddress, ParcelId};
use serde::{Deserialize, Serialize};

use crate::error::{extract_json, RpcError};
use crate::extract::{Authority, Session};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterParcelRequest {
    pub parcel_id: ParcelId,
    pub owner_address: String,
}

#[derive(Serialize)]
pub struct RegisterParcelResponse {
    pub success: bool,
    pub parcel: RegisteredParcel,
    pub message: &'static str,
}

pub async fn register(
    State(state): State<AppState>,
    Authority(authority): Authority,
    body: Result<Json<RegisterParcelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterParcelResponse>), RpcError> {
    let req = extract_json(body)?;
    let owner = OwnerAddress::parse(&req.owner_address)?;
    if owner.is_zero() {
        return Err(RpcError::invalid_input("owner address must not be zero"));
    }

    let parcel = state
        .registry
        .register_parcel(req.parcel_id, owner, authority.address)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterParcelResponse {
            success: true,
            parcel,
            message: "Parcel registered successfully",
        }),
    ))
}

#[derive(Serialize)]
pub struct ParcelListResponse {
    pub success: bool,
    pub count: usize,
    pub parcels: Vec<ParcelView>,
}

pub async fn mine(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<Json<ParcelListResponse>, RpcError> {
    let parcels = state.registry.parcels_of(&session.address)?;
    Ok(Json(ParcelListResponse {
        success: true,
        count: parcels.len(),
        parcels,
    }))
}

#[derive(Serialize)]
pub struct ParcelResponse {
    pub success: bool,
    pub parcel: ParcelView,
}

pub async fn get_parcel(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ParcelResponse>, RpcError> {
    let parcel_id: ParcelId = raw_id.parse()?;
    let parcel = state.registry.parcel(parcel_id).await?;
    Ok(Json(ParcelResponse {
        success: true,
        parcel,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerParcelResponse {
    pub success: bool,
    pub parcel_id: ParcelId,
    #[serde(flatten)]
    pub entry: LedgerEntry,
}

/// The ledger's record for a parcel, read directly and without consulting
/// the registry's own store.
pub async fn on_ledger(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<LedgerParcelResponse>, RpcError> {
    let parcel_id: ParcelId = raw_id.parse()?;
    let entry = state.ledger.get_commitment(parcel_id).await?;
    Ok(Json(LedgerParcelResponse {
        success: true,
        parcel_id,
        entry,
    }))
}
