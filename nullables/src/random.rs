//! Scripted nonce generation.

use cadastre_types::{ChallengeNonce, NonceSource};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A deterministic nonce source for testing.
///
/// Returns pre-configured values in order, wrapping around at the end.
pub struct NullNonceSource {
    outputs: Vec<u64>,
    index: AtomicUsize,
}

impl NullNonceSource {
    /// Create with a sequence of deterministic nonces.
    ///
    /// # Panics
    /// Panics if `outputs` is empty.
    pub fn new(outputs: Vec<u64>) -> Self {
        assert!(!outputs.is_empty(), "NullNonceSource needs at least one value");
        Self {
            outputs,
            index: AtomicUsize::new(0),
        }
    }

    /// Count upwards from `start`.
    pub fn counting_from(start: u64) -> Self {
        Self::new((start..start + 1_000).collect())
    }

    /// Number of nonces handed out so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

impl NonceSource for NullNonceSource {
    fn next_nonce(&self) -> ChallengeNonce {
        let idx = self.index.fetch_add(1, Ordering::SeqCst);
        ChallengeNonce::new(self.outputs[idx % self.outputs.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_in_order() {
        let src = NullNonceSource::new(vec![7, 8]);
        assert_eq!(src.next_nonce().get(), 7);
        assert_eq!(src.next_nonce().get(), 8);
        assert_eq!(src.next_nonce().get(), 7);
        assert_eq!(src.calls(), 3);
    }
}
