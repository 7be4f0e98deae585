//! Parcel commitment and secret storage trait.

use crate::StoreError;
use cadastre_types::{Hash32, OwnerAddress, ParcelId, Timestamp};
use serde::{Deserialize, Serialize};

/// The registry's private view of a parcel: who owns it, the commitment that
/// was written to the ledger, and the sealed salt that opens it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub parcel_id: ParcelId,
    pub owner: OwnerAddress,
    pub commitment: Hash32,
    /// Salt encrypted under the vault secret (nonce || ciphertext || tag).
    pub sealed_salt: Vec<u8>,
    pub registered_at: Timestamp,
    pub registered_by: OwnerAddress,
    pub updated_at: Timestamp,
}

/// Trait for parcel record storage operations.
pub trait ParcelStore: Send + Sync {
    fn get_parcel(&self, parcel_id: ParcelId) -> Result<ParcelRecord, StoreError>;

    /// Insert a new parcel. Fails with `Duplicate` if the id is taken.
    fn insert_parcel(&self, record: &ParcelRecord) -> Result<(), StoreError>;

    /// Replace an existing parcel. Fails with `NotFound` if absent.
    fn update_parcel(&self, record: &ParcelRecord) -> Result<(), StoreError>;

    /// Remove a parcel record and its owner index entry. Removing an absent
    /// parcel is not an error.
    fn remove_parcel(&self, parcel_id: ParcelId) -> Result<(), StoreError>;

    fn parcel_exists(&self, parcel_id: ParcelId) -> Result<bool, StoreError>;

    /// All parcels currently owned by `owner`, ordered by parcel id.
    fn parcels_by_owner(&self, owner: &OwnerAddress) -> Result<Vec<ParcelRecord>, StoreError>;

    fn parcel_count(&self) -> Result<u64, StoreError>;
}
