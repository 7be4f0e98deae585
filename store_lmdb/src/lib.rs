//! LMDB storage backend for the cadastre registry.
//!
//! Implements every storage trait from `cadastre-store` using the `heed` LMDB
//! bindings. Each logical store maps to one or more named databases within a
//! single environment; values are `bincode`-encoded.

pub mod audit;
pub mod environment;
pub mod error;
pub mod identity;
pub mod integrity;
mod keys;
pub mod parcel;
pub mod transfer;

pub use audit::LmdbAuditStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use identity::LmdbIdentityStore;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use parcel::LmdbParcelStore;
pub use transfer::LmdbTransferStore;
