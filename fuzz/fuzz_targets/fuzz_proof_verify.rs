#![no_main]

use std::sync::Arc;

use cadastre_nullables::NullClock;
use cadastre_proof::{OwnershipProofEngine, ProofArtifact, PublicSignals};
use cadastre_types::ProtocolParams;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

// Verification of attacker-controlled proofs and signals must return a
// report, never panic, and never accept without a commitment hash.
fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let (Some(proof), Some(signals)) = (value.get("proof"), value.get("publicSignals")) else {
        return;
    };
    let (Ok(proof), Ok(signals)) = (
        serde_json::from_value::<ProofArtifact>(proof.clone()),
        serde_json::from_value::<PublicSignals>(signals.clone()),
    ) else {
        return;
    };

    let engine = OwnershipProofEngine::new(
        Arc::new(NullClock::new(1_700_000_000_000)),
        &ProtocolParams::default(),
    );
    let verifier = signals.verifier_address;
    let report = engine.verify(&proof, &signals, verifier.as_ref());
    if report.valid {
        assert!(signals.commitment_hash.is_some());
        assert!(report.code.is_none());
    }
});
