//! The commitment ledger.
//!
//! The ledger is the single authoritative binding of a parcel id to its
//! commitment hash. This crate defines the [`CommitmentLedger`] seam, an
//! in-process ledger that can persist itself as a verified snapshot, a
//! timeout wrapper for reads and writes, and the commitment cross-check used
//! when verifying shareable proofs.

pub mod check;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod snapshot;
pub mod timed;

pub use check::{verify_parcel_commitment, CommitmentCheck, LedgerStatus};
pub use error::LedgerError;
pub use ledger::{CommitmentLedger, LedgerEntry};
pub use memory::InMemoryLedger;
pub use snapshot::{LedgerSnapshot, SnapshotEntry};
pub use timed::TimedLedger;
