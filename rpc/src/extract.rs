//! Request extractors for authenticated routes.
//!
//! A handler that takes [`Session`] only runs for requests carrying a valid
//! `Authorization: Bearer <token>` header; [`Authority`] additionally requires
//! the session to belong to a land authority.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use cadastre_auth::SessionClaims;

use crate::error::RpcError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct Session(pub SessionClaims);

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, RpcError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RpcError::unauthorized("MISSING_TOKEN", "Access token required"))?;

        let claims = state.sessions.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "session rejected");
            RpcError::from(e)
        })?;
        Ok(Session(claims))
    }
}

#[derive(Debug, Clone)]
pub struct Authority(pub SessionClaims);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authority {
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, RpcError> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;
        if !claims.is_authority {
            tracing::warn!(address = %claims.address, "authority route refused");
            return Err(RpcError::authority_required());
        }
        Ok(Authority(claims))
    }
}

/// The caller's IP address, when the server exposes connection info.
#[derive(Debug, Clone)]
pub struct ClientAddr(pub Option<String>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        ))
    }
}
