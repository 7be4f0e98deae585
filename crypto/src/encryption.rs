//! Sealing commitment salts at rest.
//!
//! The vault key is `blake2b_256(vault_secret || "cadastre-salt-vault")`. Each
//! sealed blob is a random 12-byte nonce followed by the ChaCha20-Poly1305
//! ciphertext and tag (48 bytes for a 32-byte salt).

use crate::error::CryptoError;
use crate::hash::blake2b_256_multi;
use cadastre_types::Salt;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

const VAULT_CONTEXT: &[u8] = b"cadastre-salt-vault";
const NONCE_LEN: usize = 12;

fn vault_cipher(vault_secret: &[u8]) -> ChaCha20Poly1305 {
    let key = blake2b_256_multi(&[vault_secret, VAULT_CONTEXT]);
    ChaCha20Poly1305::new(Key::from_slice(&key))
}

/// Encrypt a salt under the vault secret.
pub fn seal_salt(salt: &Salt, vault_secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = vault_cipher(vault_secret);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, salt.as_bytes().as_ref())
        .map_err(|_| CryptoError::Decryption)?;
    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a blob produced by [`seal_salt`].
pub fn open_salt(sealed: &[u8], vault_secret: &[u8]) -> Result<Salt, CryptoError> {
    if sealed.len() <= NONCE_LEN {
        return Err(CryptoError::Decryption);
    }
    let cipher = vault_cipher(vault_secret);
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let plain = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::Decryption)?;
    if plain.len() != 32 {
        return Err(CryptoError::Decryption);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&plain);
    Ok(Salt::new(bytes))
}
