//! secp256k1 wallet keys and random key material.

use crate::error::CryptoError;
use crate::sign::{address_of, personal_message_hash};
use cadastre_types::{OwnerAddress, Salt};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

/// A wallet signing key together with its derived account address.
///
/// Used by the CLI key generator and by tests that need to answer login
/// challenges the way a browser wallet would.
#[derive(Clone)]
pub struct WalletKey {
    signing: SigningKey,
    address: OwnerAddress,
}

impl WalletKey {
    fn from_signing(signing: SigningKey) -> Self {
        let address = address_of(signing.verifying_key());
        Self { signing, address }
    }

    pub fn address(&self) -> OwnerAddress {
        self.address
    }

    /// Raw 32-byte secret scalar as lower-case hex.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing.to_bytes()))
    }

    /// Produce a 65-byte `r || s || v` signature (`v` in `27/28`) over the
    /// EIP-191 personal message form of `message`.
    pub fn sign_personal(&self, message: &[u8]) -> Result<[u8; 65], CryptoError> {
        let prehash = personal_message_hash(message);
        let (sig, recid) = self
            .signing
            .sign_prehash_recoverable(&prehash)
            .map_err(|_| CryptoError::SigningFailed)?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recid.to_byte() + 27;
        Ok(out)
    }

    /// [`Self::sign_personal`] rendered as `0x`-prefixed hex.
    pub fn sign_personal_hex(&self, message: &[u8]) -> Result<String, CryptoError> {
        Ok(format!("0x{}", hex::encode(self.sign_personal(message)?)))
    }
}

impl std::fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Generate a new wallet key from a secure random source.
pub fn generate_keypair() -> WalletKey {
    WalletKey::from_signing(SigningKey::random(&mut OsRng))
}

/// Derive a wallet key from a 32-byte secret (deterministic).
///
/// Fails for the zero scalar and values at or above the curve order.
pub fn keypair_from_seed(seed: &[u8; 32]) -> Result<WalletKey, CryptoError> {
    let signing = SigningKey::from_slice(seed).map_err(|_| CryptoError::InvalidKey)?;
    Ok(WalletKey::from_signing(signing))
}

/// Draw a fresh commitment salt from the OS random source.
pub fn generate_salt() -> Salt {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Salt::new(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_deterministic() {
        let a = keypair_from_seed(&[3u8; 32]).unwrap();
        let b = keypair_from_seed(&[3u8; 32]).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn zero_seed_rejected() {
        assert!(matches!(
            keypair_from_seed(&[0u8; 32]),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_keypair().address(), generate_keypair().address());
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn debug_hides_secret() {
        let key = keypair_from_seed(&[3u8; 32]).unwrap();
        assert!(!format!("{:?}", key).contains(&key.secret_hex()[2..]));
    }
}
