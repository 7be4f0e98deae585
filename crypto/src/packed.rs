//! Solidity "packed" ABI encoding (`abi.encodePacked` / `solidityPacked`).
//!
//! Only the three static types the protocol needs are supported:
//! `address` (20 bytes), `bytes32` (32 bytes) and `uint256` (32 bytes,
//! big-endian). No padding is inserted between fields.

use crate::hash::keccak256;
use cadastre_types::{ChallengeNonce, Hash32, OwnerAddress, ParcelId, Salt};

/// Builder for a packed encoding.
#[derive(Default)]
pub struct Packed {
    buf: Vec<u8>,
}

impl Packed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, addr: &OwnerAddress) -> Self {
        self.buf.extend_from_slice(addr.as_bytes());
        self
    }

    pub fn bytes32(mut self, bytes: &[u8; 32]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn hash(self, hash: &Hash32) -> Self {
        self.bytes32(hash.as_bytes())
    }

    pub fn salt(self, salt: &Salt) -> Self {
        self.bytes32(salt.as_bytes())
    }

    /// A `uint256` holding a `u64`, left-padded to 32 bytes.
    pub fn uint256(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&[0u8; 24]);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn parcel(self, id: ParcelId) -> Self {
        self.uint256(id.get())
    }

    pub fn nonce(self, nonce: ChallengeNonce) -> Self {
        self.uint256(nonce.get())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// `keccak256(encodePacked(...))`
    pub fn keccak(&self) -> Hash32 {
        Hash32::new(keccak256(&self.buf))
    }
}

/// Render an unsigned big-endian integer of any width in base 10.
///
/// `uint_to_decimal(address.as_bytes())` gives the decimal form of an address
/// interpreted as a `uint160`.
pub fn uint_to_decimal(be_bytes: &[u8]) -> String {
    let mut digits: Vec<u8> = Vec::new();
    let mut work: Vec<u8> = be_bytes.iter().copied().skip_while(|b| *b == 0).collect();
    while !work.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(work.len());
        for byte in &work {
            let acc = (remainder << 8) | u32::from(*byte);
            let q = (acc / 10) as u8;
            remainder = acc % 10;
            if !(quotient.is_empty() && q == 0) {
                quotient.push(q);
            }
        }
        digits.push(b'0' + remainder as u8);
        work = quotient;
    }
    if digits.is_empty() {
        return "0".to_owned();
    }
    digits.iter().rev().map(|d| *d as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint256_is_left_padded() {
        let packed = Packed::new().uint256(1);
        assert_eq!(packed.as_bytes().len(), 32);
        assert_eq!(packed.as_bytes()[31], 1);
        assert!(packed.as_bytes()[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn fields_are_concatenated_without_padding() {
        let addr = OwnerAddress::new([0x11; 20]);
        let packed = Packed::new()
            .address(&addr)
            .bytes32(&[0x22; 32])
            .uint256(7);
        assert_eq!(packed.as_bytes().len(), 20 + 32 + 32);
        assert_eq!(&packed.as_bytes()[..20], &[0x11; 20]);
        assert_eq!(&packed.as_bytes()[20..52], &[0x22; 32]);
    }

    #[test]
    fn decimal_of_zero() {
        assert_eq!(uint_to_decimal(&[0u8; 20]), "0");
        assert_eq!(uint_to_decimal(&[]), "0");
    }

    #[test]
    fn decimal_matches_u64() {
        for v in [1u64, 9, 10, 255, 256, 65_535, 1_000_000, u64::MAX] {
            assert_eq!(uint_to_decimal(&v.to_be_bytes()), v.to_string());
        }
    }

    #[test]
    fn decimal_of_max_address() {
        // 2^160 - 1
        assert_eq!(
            uint_to_decimal(&[0xFF; 20]),
            "1461501637330902918203684832716283019655932542975"
        );
    }
}
