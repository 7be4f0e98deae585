#![no_main]

use cadastre_ledger::LedgerSnapshot;
use libfuzzer_sys::fuzz_target;

// Snapshot files are read from disk at startup; corrupt ones must error.
fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = LedgerSnapshot::from_json(text);
    }
});
