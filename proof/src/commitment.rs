//! Parcel commitments.
//!
//! `commitment = keccak256(encodePacked(address owner, bytes32 salt, uint256 parcelId))`
//!
//! This single field order is used everywhere a commitment is computed.

use cadastre_crypto::Packed;
use cadastre_types::{Hash32, OwnerAddress, ParcelId, Salt};

/// Compute the commitment that binds `owner` to `parcel_id` under `salt`.
pub fn compute_commitment(owner: &OwnerAddress, salt: &Salt, parcel_id: ParcelId) -> Hash32 {
    Packed::new()
        .address(owner)
        .salt(salt)
        .parcel(parcel_id)
        .keccak()
}

/// Recompute and compare. `expected` was parsed from hex, so the comparison is
/// insensitive to the case it was written in.
pub fn verify_commitment(
    owner: &OwnerAddress,
    salt: &Salt,
    parcel_id: ParcelId,
    expected: &Hash32,
) -> bool {
    compute_commitment(owner, salt, parcel_id) == *expected
}
