#![no_main]

use cadastre_types::{ChallengeNonce, Hash32, OwnerAddress, ParcelId, Salt};
use libfuzzer_sys::fuzz_target;

// Identifiers arriving in requests: parse must not panic, and whatever
// parses must print back to a string that parses to the same value.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(addr) = OwnerAddress::parse(s) {
        assert_eq!(OwnerAddress::parse(&addr.to_string()).ok(), Some(addr));
    }
    if let Ok(id) = s.parse::<ParcelId>() {
        assert_eq!(id.to_string().parse::<ParcelId>().ok(), Some(id));
    }
    if let Ok(hash) = s.parse::<Hash32>() {
        assert_eq!(hash.to_string().parse::<Hash32>().ok(), Some(hash));
    }
    if let Ok(nonce) = s.parse::<ChallengeNonce>() {
        assert_eq!(nonce.to_string().parse::<ChallengeNonce>().ok(), Some(nonce));
    }
    if let Ok(salt) = Salt::from_hex(s) {
        assert_eq!(Salt::from_hex(&salt.to_hex()).ok().map(|s| s.to_hex()), Some(salt.to_hex()));
    }
});
