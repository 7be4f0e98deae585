//! Parcel identifiers.

use crate::error::TypeError;
use crate::serde_util::decimal_text;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A positive integer identifying a land parcel.
///
/// On JSON wires the id travels as a decimal string (numbers are accepted on
/// input); binary encodings store the plain `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParcelId(u64);

impl ParcelId {
    pub fn new(id: u64) -> Result<Self, TypeError> {
        if id == 0 {
            return Err(TypeError::InvalidParcelId("0".into()));
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParcelId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u64 = s
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidParcelId(s.to_owned()))?;
        Self::new(id).map_err(|_| TypeError::InvalidParcelId(s.to_owned()))
    }
}

impl Serialize for ParcelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ParcelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let raw = decimal_text(deserializer)?;
            raw.parse().map_err(serde::de::Error::custom)
        } else {
            let id = u64::deserialize(deserializer)?;
            Self::new(id).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(ParcelId::new(0).is_err());
        assert!("0".parse::<ParcelId>().is_err());
    }

    #[test]
    fn negative_and_garbage_rejected() {
        assert!("-4".parse::<ParcelId>().is_err());
        assert!("abc".parse::<ParcelId>().is_err());
    }

    #[test]
    fn json_accepts_string_and_number() {
        let a: ParcelId = serde_json::from_str("\"42\"").unwrap();
        let b: ParcelId = serde_json::from_str("42").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
    }

    #[test]
    fn bincode_is_plain_u64() {
        let id = ParcelId::new(77).unwrap();
        let encoded = bincode::serialize(&id).unwrap();
        assert_eq!(encoded.len(), 8);
        let decoded: ParcelId = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, id);
    }
}
