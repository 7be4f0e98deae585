//! Wire shapes of an ownership proof.
//!
//! [`ProofArtifact`] is the raw positional form clients exchange:
//!
//! ```text
//! pi_a = [inputHash, timestampMs]
//! pi_b = [[parcelId, challengeNonce]]
//! pi_c = [verifierAsDecimal | "0"]
//! ```
//!
//! It is parsed exactly once, by [`ProofArtifact::parse`], into the named
//! [`ParsedProof`]; nothing else indexes into the arrays.

use cadastre_types::{ChallengeNonce, Hash32, OwnerAddress, ParcelId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::VerifyFailure;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProofKind {
    Public,
    VerifierBound,
}

/// The positional proof object as it travels on the wire.
///
/// Any JSON object deserializes. A field that is absent, `null`, not an array,
/// or holds an element that is neither a string nor an integer comes through
/// empty, so the structure check in [`ProofArtifact::parse`] rejects it after
/// the binding and freshness checks have run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireArtifact")]
pub struct ProofArtifact {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(rename = "proofType", skip_serializing_if = "Option::is_none")]
    pub proof_type: Option<ProofKind>,
    #[serde(rename = "proofSignature", skip_serializing_if = "Option::is_none")]
    pub proof_signature: Option<String>,
}

#[derive(Deserialize)]
struct WireArtifact {
    #[serde(default)]
    pi_a: Value,
    #[serde(default)]
    pi_b: Value,
    #[serde(default)]
    pi_c: Value,
    #[serde(rename = "proofType", default)]
    proof_type: Value,
    #[serde(rename = "proofSignature", default)]
    proof_signature: Value,
}

impl From<WireArtifact> for ProofArtifact {
    fn from(wire: WireArtifact) -> Self {
        let pi_b = match wire.pi_b {
            Value::Array(rows) => rows
                .iter()
                .map(text_row)
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        ProofArtifact {
            pi_a: text_row(&wire.pi_a).unwrap_or_default(),
            pi_b,
            pi_c: text_row(&wire.pi_c).unwrap_or_default(),
            proof_type: serde_json::from_value(wire.proof_type).ok(),
            proof_signature: wire.proof_signature.as_str().map(str::to_owned),
        }
    }
}

/// An array of strings or integers, as text. `None` for any other shape.
fn text_row(value: &Value) -> Option<Vec<String>> {
    value.as_array()?.iter().map(text_element).collect()
}

fn text_element(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

/// The named view of a [`ProofArtifact`].
///
/// Claimed values are kept as the exact text found in the proof, because the
/// cross-field checks compare them with the canonical text of the public
/// signals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedProof {
    pub input_hash: Hash32,
    pub generated_at: Timestamp,
    pub claimed_parcel_id: String,
    pub claimed_nonce: String,
    pub claimed_verifier: String,
    pub kind: Option<ProofKind>,
    pub signature: Option<String>,
}

impl ProofArtifact {
    /// Structural validation: `pi_a` has at least two entries, `pi_b` at least
    /// one row of at least two, `pi_c` at least one, and the input hash and
    /// timestamp are well formed.
    pub fn parse(&self) -> Result<ParsedProof, VerifyFailure> {
        let [input_hash, timestamp, ..] = self.pi_a.as_slice() else {
            return Err(VerifyFailure::MalformedProof("Invalid pi_a format".into()));
        };
        let Some([parcel_id, nonce, ..]) = self.pi_b.first().map(Vec::as_slice) else {
            return Err(VerifyFailure::MalformedProof("Invalid pi_b format".into()));
        };
        let Some(verifier) = self.pi_c.first() else {
            return Err(VerifyFailure::MalformedProof("Invalid pi_c format".into()));
        };

        let input_hash = Hash32::parse(input_hash)
            .map_err(|_| VerifyFailure::MalformedProof("pi_a input hash is not 32 bytes".into()))?;
        let generated_at = timestamp
            .parse::<u64>()
            .map(Timestamp::from_millis)
            .map_err(|_| VerifyFailure::MalformedProof("pi_a timestamp is not an integer".into()))?;

        Ok(ParsedProof {
            input_hash,
            generated_at,
            claimed_parcel_id: parcel_id.clone(),
            claimed_nonce: nonce.clone(),
            claimed_verifier: verifier.clone(),
            kind: self.proof_type,
            signature: self.proof_signature.clone(),
        })
    }
}

/// The public half of a proof: everything a verifier may see.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSignals {
    pub parcel_id: ParcelId,
    pub expected_commitment: Hash32,
    pub challenge_nonce: ChallengeNonce,
    /// `None` for a public proof; travels as `"0x0"`.
    #[serde(with = "verifier_field", default)]
    pub verifier_address: Option<OwnerAddress>,
    /// Generation time in milliseconds.
    pub timestamp: Timestamp,
    /// Informational only; verification derives publicness from
    /// `verifier_address`.
    #[serde(default)]
    pub is_public: bool,
    /// `keccak256(expectedCommitment ‖ parcelId)`.
    #[serde(default)]
    pub commitment_hash: Option<Hash32>,
}

impl PublicSignals {
    pub fn derived_is_public(&self) -> bool {
        self.verifier_address.is_none()
    }
}

/// A generated proof and its public signals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipProof {
    pub proof: ProofArtifact,
    pub public_signals: PublicSignals,
}

/// `"0x0"` (also `"0"`, `""` and the zero address) on the wire means "no verifier".
pub(crate) mod verifier_field {
    use cadastre_types::OwnerAddress;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const PUBLIC_SENTINEL: &str = "0x0";

    pub fn serialize<S: Serializer>(v: &Option<OwnerAddress>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(addr) => s.collect_str(addr),
            None => s.serialize_str(PUBLIC_SENTINEL),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<OwnerAddress>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<Option<OwnerAddress>, cadastre_types::TypeError> {
        match raw.trim() {
            "" | "0" | "0x0" | "0x" => Ok(None),
            other => {
                let addr = OwnerAddress::parse(other)?;
                Ok((!addr.is_zero()).then_some(addr))
            }
        }
    }
}
