#![no_main]

use cadastre_proof::{ProofArtifact, PublicSignals};
use libfuzzer_sys::fuzz_target;

// Arbitrary JSON must never panic the positional proof parser.
fuzz_target!(|data: &[u8]| {
    // Any JSON object is accepted; shape problems surface from `parse`.
    if let Ok(serde_json::Value::Object(object)) = serde_json::from_slice(data) {
        let value = serde_json::Value::Object(object);
        assert!(serde_json::from_value::<ProofArtifact>(value).is_ok());
    }

    if let Ok(artifact) = serde_json::from_slice::<ProofArtifact>(data) {
        if let Ok(parsed) = artifact.parse() {
            // Parsing keeps the claimed text verbatim.
            assert_eq!(artifact.pi_b[0][0], parsed.claimed_parcel_id);
        }
    }

    let _ = serde_json::from_slice::<PublicSignals>(data);
});
