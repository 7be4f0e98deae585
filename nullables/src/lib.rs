//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, randomness, storage, ledger) are
//! abstracted behind traits. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests. The node also
//! uses [`NullStore`] as its ephemeral `memory` storage backend.

pub mod clock;
pub mod ledger;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use ledger::{LedgerFault, NullLedger};
pub use random::NullNonceSource;
pub use store::NullStore;
