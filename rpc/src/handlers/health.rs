//! Liveness, ledger health and Prometheus exposition.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cadastre_ledger::CommitmentLedger;
use cadastre_utils::format_duration_ms;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RpcError;
use crate::state::AppState;

#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Services {
    pub storage: ServiceHealth,
    pub ledger: ServiceHealth,
    pub proof_system: ServiceHealth,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since start.
    pub uptime: u64,
    pub uptime_human: String,
    pub services: Services,
}

/// 200 when every dependency answers, 503 with the same body otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let storage = match state.registry.parcel_count() {
        Ok(_) => ServiceHealth::Healthy,
        Err(e) => {
            tracing::error!(error = %e, "storage health check failed");
            ServiceHealth::Unhealthy
        }
    };
    let ledger = match state.ledger.height().await {
        Ok(_) => ServiceHealth::Healthy,
        Err(e) => {
            tracing::error!(error = %e, "ledger health check failed");
            ServiceHealth::Unhealthy
        }
    };

    let healthy = storage == ServiceHealth::Healthy && ledger == ServiceHealth::Healthy;
    let uptime_ms = state.started_at.elapsed_since(state.clock.now());
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        timestamp: Utc::now(),
        uptime: uptime_ms / 1000,
        uptime_human: format_duration_ms(uptime_ms),
        services: Services {
            storage,
            ledger,
            proof_system: ServiceHealth::Healthy,
        },
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInfo {
    pub connected: bool,
    pub height: u64,
    pub timeouts: u64,
    pub timeout_ms: u64,
}

#[derive(Serialize)]
pub struct LedgerHealthResponse {
    pub success: bool,
    pub ledger: LedgerInfo,
}

pub async fn ledger_health(
    State(state): State<AppState>,
) -> Result<Json<LedgerHealthResponse>, RpcError> {
    let height = state.ledger.height().await.map_err(|e| {
        tracing::error!(error = %e, "ledger health check failed");
        RpcError::Unavailable(format!("Ledger not available: {e}"))
    })?;
    Ok(Json(LedgerHealthResponse {
        success: true,
        ledger: LedgerInfo {
            connected: true,
            height,
            timeouts: state.ledger.timeouts(),
            timeout_ms: state.params.ledger_timeout_ms,
        },
    }))
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, RpcError> {
    let timeouts = i64::try_from(state.ledger.timeouts()).unwrap_or(i64::MAX);
    state.metrics.ledger_timeouts.set(timeouts);
    if let Ok(count) = state.registry.parcel_count() {
        state
            .metrics
            .parcel_count
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    let text = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}
