//! Parcel ownership proofs.
//!
//! Ownership is asserted with a deterministic hash-commitment scheme, not a
//! zero-knowledge proof system: there is no circuit and no succinctness or
//! soundness argument. What the scheme does provide:
//!
//! - [`commitment`]: `keccak256(owner ‖ salt ‖ parcelId)`, the value the
//!   ledger binds to each parcel.
//! - [`engine`]: proofs that bind a parcel, a challenge nonce and an optional
//!   verifier together, with freshness, replay and tamper checks on verify.
//! - [`envelope`]: a portable, self-describing proof with its own 24h expiry
//!   that is cross-checked against the ledger when verified.
//!
//! Two limits of the verifier are worth knowing before relying on it:
//!
//! - Freshness only bounds age from below. A proof stamped in the future
//!   counts as age zero and passes the freshness check.
//! - `proofSignature` is checked for format only (`0x` plus 64 hex digits).
//!   It is not a signature by the owner's key, and verification says
//!   nothing about who produced the proof. The binding comes from the
//!   commitment, which only the salt holder can recompute.
//!
//! The wire field names (`zkProof`, `pi_a`, `pi_b`, `pi_c`) are kept for
//! interoperability with existing clients.

pub mod artifact;
pub mod commitment;
pub mod engine;
pub mod envelope;
pub mod error;

pub use artifact::{
    OwnershipProof, ParsedProof, ProofArtifact, ProofKind, PublicSignals,
};
pub use commitment::{compute_commitment, verify_commitment};
pub use engine::{CheckSet, OwnershipProofEngine, ProofRequest, VerificationReport};
pub use envelope::{
    EnvelopeVerdict, ShareRequest, ShareableProof, ShareableProofService,
    VerificationInstructions, VerdictStatus,
};
pub use error::{EnvelopeError, VerifyFailure};
