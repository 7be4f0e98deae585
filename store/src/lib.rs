//! Abstract storage traits for the cadastre registry.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod audit;
pub mod error;
pub mod identity;
pub mod parcel;
pub mod transfer;

pub use audit::{AuditStore, SharedProofRecord, VerificationRecord};
pub use error::StoreError;
pub use identity::{Identity, IdentityStore};
pub use parcel::{ParcelRecord, ParcelStore};
pub use transfer::{TransferRecord, TransferStatus, TransferStore};
