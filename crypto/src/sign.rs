//! EIP-191 `personal_sign` hashing and secp256k1 signer recovery.

use crate::error::CryptoError;
use crate::hash::{keccak256, keccak256_multi};
use cadastre_types::OwnerAddress;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

const PERSONAL_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let len = message.len().to_string();
    keccak256_multi(&[PERSONAL_PREFIX, len.as_bytes(), message])
}

/// Decode a 65-byte `r || s || v` signature from hex (with or without `0x`).
pub fn parse_signature(raw: &str) -> Result<[u8; 65], CryptoError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.len() != 130 {
        return Err(CryptoError::MalformedSignature(format!(
            "expected 65 bytes, got {} hex digits",
            digits.len()
        )));
    }
    let mut out = [0u8; 65];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    Ok(out)
}

/// Recover the address that produced `signature` over the personal message `message`.
///
/// `v` may be given as `0/1` or `27/28`. High-`s` signatures are normalised
/// before recovery.
pub fn recover_personal_signer(
    message: &[u8],
    signature: &[u8; 65],
) -> Result<OwnerAddress, CryptoError> {
    let v = match signature[64] {
        v @ 0..=1 => v,
        v @ 27..=28 => v - 27,
        other => {
            return Err(CryptoError::MalformedSignature(format!(
                "invalid recovery byte {other}"
            )))
        }
    };
    let mut recid = RecoveryId::from_byte(v).ok_or(CryptoError::RecoveryFailed)?;
    let mut sig = Signature::from_slice(&signature[..64])
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        recid = RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced());
    }

    let prehash = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&prehash, &sig, recid)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_of(&key))
}

/// The account address of a public key: last 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
pub fn address_of(key: &VerifyingKey) -> OwnerAddress {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    OwnerAddress::new(addr)
}
