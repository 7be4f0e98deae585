//! Ownership transfer request storage trait.

use crate::StoreError;
use cadastre_types::{OwnerAddress, ParcelId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: Uuid,
    pub parcel_id: ParcelId,
    pub from: OwnerAddress,
    pub to: OwnerAddress,
    pub reason: Option<String>,
    pub status: TransferStatus,
    pub requested_at: Timestamp,
    pub decided_at: Option<Timestamp>,
    pub decided_by: Option<OwnerAddress>,
    pub notes: Option<String>,
}

/// Trait for transfer request storage operations.
pub trait TransferStore: Send + Sync {
    fn get_transfer(&self, id: &Uuid) -> Result<TransferRecord, StoreError>;

    /// Insert or replace a transfer record.
    fn put_transfer(&self, record: &TransferRecord) -> Result<(), StoreError>;

    /// Pending requests, oldest first.
    fn pending_transfers(&self) -> Result<Vec<TransferRecord>, StoreError>;

    /// The pending request for `parcel_id`, if any.
    fn pending_for_parcel(&self, parcel_id: ParcelId)
        -> Result<Option<TransferRecord>, StoreError>;
}
