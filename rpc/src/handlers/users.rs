//! Wallet identity lookup.

use axum::extract::{Path, State};
use axum::Json;
use cadastre_auth::AuthError;
use cadastre_store::Identity;
use cadastre_types::{OwnerAddress, Timestamp};
use serde::Serialize;

use crate::error::RpcError;
use crate::extract::Session;
use crate::state::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Authority,
    Owner,
}

/// An identity as shown to clients. The outstanding login nonce is never
/// included.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub address: OwnerAddress,
    pub role: Role,
    pub is_authority: bool,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<Timestamp>,
}

impl From<Identity> for UserView {
    fn from(identity: Identity) -> Self {
        Self {
            address: identity.address,
            role: if identity.is_authority {
                Role::Authority
            } else {
                Role::Owner
            },
            is_authority: identity.is_authority,
            created_at: identity.created_at,
            last_login: identity.last_login,
        }
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserView,
}

fn lookup(state: &AppState, address: &OwnerAddress) -> Result<UserView, RpcError> {
    match state.authenticator.identity(address) {
        Ok(identity) => Ok(identity.into()),
        Err(AuthError::IdentityNotFound(_)) => Err(RpcError::NotFound {
            code: "USER_NOT_FOUND",
            message: "User not found".into(),
        }),
        Err(e) => Err(e.into()),
    }
}

pub async fn profile(
    State(state): State<AppState>,
    Session(session): Session,
) -> Result<Json<UserResponse>, RpcError> {
    let user = lookup(&state, &session.address)?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

pub async fn by_address(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<UserResponse>, RpcError> {
    let address = OwnerAddress::parse(&raw)?;
    let user = lookup(&state, &address)?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}
