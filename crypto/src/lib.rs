//! Cryptographic primitives for the cadastre registry.
//!
//! - **Keccak-256** over Solidity-packed encodings for commitments and proof hashes
//! - **secp256k1** recoverable signatures over EIP-191 personal messages (wallet login)
//! - **ChaCha20-Poly1305** sealing of commitment salts at rest, keyed via **Blake2b**

pub mod encryption;
pub mod error;
pub mod hash;
pub mod keys;
pub mod packed;
pub mod sign;

pub use encryption::{open_salt, seal_salt};
pub use error::CryptoError;
pub use hash::{blake2b_256_multi, keccak256, keccak256_multi};
pub use keys::{generate_keypair, generate_salt, keypair_from_seed, WalletKey};
pub use packed::{uint_to_decimal, Packed};
pub use sign::{address_of, parse_signature, personal_message_hash, recover_personal_signer};
