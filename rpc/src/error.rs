//! API error type.
//!
//! Every failure leaves the API as `{ "success": false, "message", "code" }`
//! with an HTTP status derived from the domain error. Internal error details
//! are logged, never returned.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cadastre_auth::{AuthError, SessionError};
use cadastre_ledger::LedgerError;
use cadastre_proof::EnvelopeError;
use cadastre_registry::RegistryError;
use cadastre_store::StoreError;
use cadastre_types::TypeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("Proof has expired")]
    EnvelopeExpired { expired_at: DateTime<Utc> },

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: "INVALID_INPUT",
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn authority_required() -> Self {
        Self::Forbidden {
            code: "AUTHORITY_REQUIRED",
            message: "Authority access required".into(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, *code),
            Self::Unauthorized { code, .. } => (StatusCode::UNAUTHORIZED, *code),
            Self::Forbidden { code, .. } => (StatusCode::FORBIDDEN, *code),
            Self::NotFound { code, .. } => (StatusCode::NOT_FOUND, *code),
            Self::Conflict { code, .. } => (StatusCode::CONFLICT, *code),
            Self::EnvelopeExpired { .. } => (StatusCode::BAD_REQUEST, "ENVELOPE_EXPIRED"),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "LEDGER_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let expired_at = match &self {
            Self::EnvelopeExpired { expired_at } => Some(*expired_at),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            message,
            code: code.to_string(),
            expired_at,
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning deserialization failures into `INVALID_INPUT`.
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| RpcError::invalid_input(rejection.body_text()))
}

impl From<TypeError> for RpcError {
    fn from(err: TypeError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

impl From<AuthError> for RpcError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            AuthError::InvalidInput(_) | AuthError::MalformedSignature(_) => {
                Self::BadRequest { code, message }
            }
            AuthError::IdentityNotFound(_) => Self::NotFound {
                code,
                message: "User not found. Please request a nonce first.".into(),
            },
            AuthError::SignatureMismatch => Self::Unauthorized {
                code,
                message: "Signature verification failed".into(),
            },
            AuthError::Store(_) => Self::Internal(message),
        }
    }
}

impl From<SessionError> for RpcError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Expired => Self::unauthorized("TOKEN_EXPIRED", "Session has expired"),
            SessionError::Malformed | SessionError::BadSignature | SessionError::WrongAudience => {
                Self::unauthorized("INVALID_TOKEN", "Invalid session token")
            }
            SessionError::InvalidSecret | SessionError::Encoding(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<RegistryError> for RpcError {
    fn from(err: RegistryError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            RegistryError::InvalidRecipient(_) => Self::BadRequest { code, message },
            RegistryError::NotOwner(_) => Self::Forbidden { code, message },
            RegistryError::ParcelNotFound(_) | RegistryError::TransferNotFound(_) => {
                Self::NotFound { code, message }
            }
            RegistryError::AlreadyRegistered(_)
            | RegistryError::TransferPending(_)
            | RegistryError::AlreadyDecided(_) => Self::Conflict { code, message },
            RegistryError::Ledger(e) => e.into(),
            RegistryError::Store(e) => e.into(),
            RegistryError::Vault(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<LedgerError> for RpcError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        if err.is_transient() {
            return Self::Unavailable(message);
        }
        match err {
            LedgerError::ParcelNotFound(_) => Self::NotFound {
                code: "PARCEL_NOT_FOUND",
                message,
            },
            LedgerError::AlreadyRegistered(_) => Self::Conflict {
                code: "PARCEL_ALREADY_REGISTERED",
                message,
            },
            _ => Self::Internal(message),
        }
    }
}

impl From<EnvelopeError> for RpcError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Expired { expired_at } => Self::EnvelopeExpired { expired_at },
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}
