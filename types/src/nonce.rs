//! Challenge nonces.

use crate::error::TypeError;
use crate::serde_util::decimal_text;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A decimal nonce bound into a login challenge or an ownership proof.
///
/// Login nonces are drawn from `[0, nonce_space)`; proof nonces may be any `u64`
/// (by default the generation time in milliseconds).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChallengeNonce(u64);

impl ChallengeNonce {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChallengeNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChallengeNonce {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| TypeError::InvalidNonce(s.to_owned()))
    }
}

impl Serialize for ChallengeNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ChallengeNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let raw = decimal_text(deserializer)?;
            raw.parse().map_err(serde::de::Error::custom)
        } else {
            u64::deserialize(deserializer).map(Self)
        }
    }
}

/// Source of fresh login nonces.
///
/// The production source draws uniformly from `[0, nonce_space)` using the OS
/// random generator; tests script the sequence.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> ChallengeNonce;
}
