#![no_main]

use cadastre_proof::ShareableProof;
use libfuzzer_sys::fuzz_target;

// Any envelope that parses must survive a serialize/parse round trip.
fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = serde_json::from_slice::<ShareableProof>(data) else {
        return;
    };
    let encoded = serde_json::to_vec(&envelope).expect("parsed envelope must serialize");
    let decoded: ShareableProof =
        serde_json::from_slice(&encoded).expect("serialized envelope must parse");
    assert_eq!(envelope, decoded);
});
