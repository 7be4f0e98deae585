//! Key layout helpers.
//!
//! All integers are big-endian so that LMDB's lexicographic key order matches
//! numeric order.

use std::ops::Bound;

use cadastre_types::{OwnerAddress, ParcelId, Timestamp};
use heed::types::Bytes;
use heed::{Database, RoTxn};

use crate::LmdbError;

/// Turn `prefix` into the smallest key greater than every key that starts
/// with it. An all-`0xff` prefix becomes empty, meaning "no upper bound".
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.pop() {
        if last < u8::MAX {
            prefix.push(last + 1);
            return;
        }
    }
}

/// Every value whose key starts with `prefix`, in key order.
pub(crate) fn range_scan_values(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn<'_>,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, LmdbError> {
    let mut upper = prefix.to_vec();
    increment_prefix(&mut upper);
    let upper_bound = if upper.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(upper.as_slice())
    };
    let bounds = (Bound::Included(prefix), upper_bound);
    let mut results = Vec::new();
    for result in db.range(rtxn, &bounds)? {
        let (_key, val) = result?;
        results.push(val.to_vec());
    }
    Ok(results)
}

/// `owner(20) ++ parcel_id(8)`
pub(crate) fn owner_parcel_key(owner: &OwnerAddress, parcel_id: ParcelId) -> Vec<u8> {
    let mut key = Vec::with_capacity(28);
    key.extend_from_slice(owner.as_bytes());
    key.extend_from_slice(&parcel_id.to_be_bytes());
    key
}

/// `prover(20) ++ created_at(8) ++ seq(8)`
pub(crate) fn shared_proof_key(prover: &OwnerAddress, created_at: Timestamp, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(36);
    key.extend_from_slice(prover.as_bytes());
    key.extend_from_slice(&created_at.as_millis().to_be_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// `parcel_id(8) ++ prover(20)`, the prefix of every verification key.
pub(crate) fn verification_prefix(parcel_id: ParcelId, prover: &OwnerAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(36);
    key.extend_from_slice(&parcel_id.to_be_bytes());
    key.extend_from_slice(prover.as_bytes());
    key
}
