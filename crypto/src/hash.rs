//! Keccak-256 for commitments and proofs, Blake2b for key derivation.

use blake2::digest::consts::U32;
use blake2::Blake2b;
use sha3::{Digest, Keccak256};

type Blake2b256 = Blake2b<U32>;

/// Compute the Keccak-256 hash of arbitrary data (the pre-standard SHA-3 variant
/// used by the commitment ledger).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Blake2b-256 over several parts. Used only to derive symmetric keys.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
