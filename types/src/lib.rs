//! Fundamental types for the cadastre parcel registry.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! owner addresses, parcel identifiers, 32-byte hashes, salts, challenge nonces,
//! millisecond timestamps and the protocol parameters.

pub mod address;
pub mod error;
pub mod hash;
pub mod nonce;
pub mod params;
pub mod parcel;
pub mod salt;
mod serde_util;
pub mod time;

pub use address::OwnerAddress;
pub use error::TypeError;
pub use hash::Hash32;
pub use nonce::{ChallengeNonce, NonceSource};
pub use params::ProtocolParams;
pub use parcel::ParcelId;
pub use salt::Salt;
pub use time::{Clock, SystemClock, Timestamp};
