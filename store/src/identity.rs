//! Identity (wallet login) storage trait.

use crate::StoreError;
use cadastre_types::{ChallengeNonce, OwnerAddress, Timestamp};
use serde::{Deserialize, Serialize};

/// A wallet that has requested at least one login challenge, or was seeded
/// as an authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub address: OwnerAddress,
    /// The single outstanding challenge nonce. `None` until a challenge is issued.
    pub current_nonce: Option<ChallengeNonce>,
    pub is_authority: bool,
    pub created_at: Timestamp,
    pub last_login: Option<Timestamp>,
}

impl Identity {
    pub fn new(address: OwnerAddress, now: Timestamp) -> Self {
        Self {
            address,
            current_nonce: None,
            is_authority: false,
            created_at: now,
            last_login: None,
        }
    }
}

/// Keyed identity records with atomic nonce updates.
///
/// Implementations must make `upsert_nonce` and `compare_and_swap_nonce`
/// atomic per address: concurrent issuance is last-write-wins, and of two
/// concurrent swaps from the same expected nonce at most one succeeds.
pub trait IdentityStore: Send + Sync {
    fn get_identity(&self, address: &OwnerAddress) -> Result<Identity, StoreError>;

    /// Create the identity if absent, then overwrite its nonce.
    fn upsert_nonce(
        &self,
        address: &OwnerAddress,
        nonce: ChallengeNonce,
        now: Timestamp,
    ) -> Result<Identity, StoreError>;

    /// Replace the nonce with `next` only if it currently equals `expected`.
    /// Records `now` as the last login on success. Returns whether the swap
    /// happened.
    fn compare_and_swap_nonce(
        &self,
        address: &OwnerAddress,
        expected: ChallengeNonce,
        next: ChallengeNonce,
        now: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Create the identity if absent, then set its authority flag.
    fn set_authority(
        &self,
        address: &OwnerAddress,
        is_authority: bool,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    fn identity_count(&self) -> Result<u64, StoreError>;
}
