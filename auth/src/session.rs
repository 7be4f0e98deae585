//! HMAC-SHA256 session tokens.
//!
//! A token is `hex(claims_json) "." hex(hmac_sha256(secret, claims_json))`.
//! Claims carry the authenticated address and role, issue and expiry times
//! in milliseconds, and a fixed issuer and audience.

use std::sync::Arc;

use cadastre_types::{Clock, OwnerAddress, Timestamp};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::challenge::AuthenticatedIdentity;
use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

pub const ISSUER: &str = "cadastre-system";
pub const AUDIENCE: &str = "cadastre-users";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub address: OwnerAddress,
    pub is_authority: bool,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub token: String,
    pub expires_at: Timestamp,
}

pub struct SessionIssuer {
    keyed: HmacSha256,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    /// Fails for an empty secret.
    pub fn new(secret: &[u8], ttl_secs: u64, clock: Arc<dyn Clock>) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret)
            .map_err(|_| SessionError::InvalidSecret)?;
        Ok(Self {
            keyed,
            ttl_ms: ttl_secs.saturating_mul(1000),
            clock,
        })
    }

    pub fn issue(&self, who: &AuthenticatedIdentity) -> Result<SessionToken, SessionError> {
        let now = self.clock.now();
        let claims = SessionClaims {
            address: who.address,
            is_authority: who.is_authority,
            issued_at: now,
            expires_at: now.plus_millis(self.ttl_ms),
            iss: ISSUER.to_owned(),
            aud: AUDIENCE.to_owned(),
        };
        let body =
            serde_json::to_vec(&claims).map_err(|e| SessionError::Encoding(e.to_string()))?;
        let mut mac = self.keyed.clone();
        mac.update(&body);
        let tag = mac.finalize().into_bytes();
        Ok(SessionToken {
            token: format!("{}.{}", hex::encode(&body), hex::encode(tag)),
            expires_at: claims.expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let (body_hex, tag_hex) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let body = hex::decode(body_hex).map_err(|_| SessionError::Malformed)?;
        let tag = hex::decode(tag_hex).map_err(|_| SessionError::Malformed)?;

        let mut mac = self.keyed.clone();
        mac.update(&body);
        mac.verify_slice(&tag)
            .map_err(|_| SessionError::BadSignature)?;

        let claims: SessionClaims =
            serde_json::from_slice(&body).map_err(|_| SessionError::Malformed)?;
        if claims.iss != ISSUER || claims.aud != AUDIENCE {
            return Err(SessionError::WrongAudience);
        }
        if self.clock.now() > claims.expires_at {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }
}
