//! The ledger seam.

use crate::LedgerError;
use async_trait::async_trait;
use cadastre_types::{Hash32, OwnerAddress, ParcelId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the ledger knows about a parcel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub exists: bool,
    pub commitment_hash: Option<Hash32>,
    pub owner: Option<OwnerAddress>,
}

impl LedgerEntry {
    pub fn missing() -> Self {
        Self {
            exists: false,
            commitment_hash: None,
            owner: None,
        }
    }
}

/// A store of `parcel id → commitment hash` that the rest of the system
/// treats as the source of truth.
///
/// Writes return the ledger height after the write.
#[async_trait]
pub trait CommitmentLedger: Send + Sync {
    async fn get_commitment(&self, parcel_id: ParcelId) -> Result<LedgerEntry, LedgerError>;

    async fn register_commitment(
        &self,
        parcel_id: ParcelId,
        owner: OwnerAddress,
        commitment: Hash32,
    ) -> Result<u64, LedgerError>;

    async fn transfer_commitment(
        &self,
        parcel_id: ParcelId,
        new_owner: OwnerAddress,
        new_commitment: Hash32,
    ) -> Result<u64, LedgerError>;

    /// Number of writes applied so far.
    async fn height(&self) -> Result<u64, LedgerError>;
}

#[async_trait]
impl<L: CommitmentLedger + ?Sized> CommitmentLedger for Arc<L> {
    async fn get_commitment(&self, parcel_id: ParcelId) -> Result<LedgerEntry, LedgerError> {
        (**self).get_commitment(parcel_id).await
    }

    async fn register_commitment(
        &self,
        parcel_id: ParcelId,
        owner: OwnerAddress,
        commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        (**self).register_commitment(parcel_id, owner, commitment).await
    }

    async fn transfer_commitment(
        &self,
        parcel_id: ParcelId,
        new_owner: OwnerAddress,
        new_commitment: Hash32,
    ) -> Result<u64, LedgerError> {
        (**self)
            .transfer_commitment(parcel_id, new_owner, new_commitment)
            .await
    }

    async fn height(&self) -> Result<u64, LedgerError> {
        (**self).height().await
    }
}
