//! Protocol parameters shared by the authenticator, proof engine and envelope.

use serde::{Deserialize, Serialize};

pub const HOUR_MS: u64 = 60 * 60 * 1000;

/// Tunable protocol constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    // ── Proofs ──────────────────────────────────────────────────────────
    /// A proof whose `publicSignals.timestamp` is older than this is expired.
    /// An age exactly equal to the limit is still fresh.
    pub max_proof_age_ms: u64,

    /// Lifetime of a shareable envelope, from `generatedAt` to `expiresAt`.
    pub envelope_ttl_ms: u64,

    // ── Authentication ──────────────────────────────────────────────────
    /// Login nonces are drawn uniformly from `[0, nonce_space)`.
    pub nonce_space: u64,

    /// Lifetime of a session token in seconds.
    pub session_ttl_secs: u64,

    // ── Ledger ──────────────────────────────────────────────────────────
    /// Upper bound on a single ledger read before it is reported unavailable.
    pub ledger_timeout_ms: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            max_proof_age_ms: 24 * HOUR_MS,
            envelope_ttl_ms: 24 * HOUR_MS,
            nonce_space: 1_000_000,
            session_ttl_secs: 24 * 60 * 60,
            ledger_timeout_ms: 5_000,
        }
    }
}
