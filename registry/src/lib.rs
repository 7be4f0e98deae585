//! Parcel registry: registration, ownership lookup and the transfer workflow.
//!
//! The registry is the only writer of parcel commitments. It generates each
//! parcel's salt, binds `keccak256(owner ‖ salt ‖ parcelId)` on the ledger and
//! keeps the salt sealed under the vault secret so that the owner can later
//! produce ownership proofs.

pub mod error;
pub mod registry;
pub mod transfer;

pub use error::RegistryError;
pub use registry::{OwnerSecret, ParcelRegistry, ParcelView, RegisteredParcel};
