//! Production nonce source.

use cadastre_types::{ChallengeNonce, NonceSource};
use rand::rngs::OsRng;
use rand::Rng;

/// Draws nonces uniformly from `[0, space)` with the OS random generator.
#[derive(Clone, Copy, Debug)]
pub struct OsNonceSource {
    space: u64,
}

impl OsNonceSource {
    /// A `space` of zero is treated as one (every nonce is `0`).
    pub fn new(space: u64) -> Self {
        Self {
            space: space.max(1),
        }
    }
}

impl NonceSource for OsNonceSource {
    fn next_nonce(&self) -> ChallengeNonce {
        ChallengeNonce::new(OsRng.gen_range(0..self.space))
    }
}
