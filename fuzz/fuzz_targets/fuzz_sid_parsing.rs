//! Fuzz target for security identifier decoding.
//!
//! Both the textual and the packed binary decoders must reject malformed
//! input without panicking.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_sid_parsing -- -max_total_time=600

#![no_main]

use idsync_connector::sid::SecurityIdentifier;
use idsync_engine::identity::derive_identity;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(sid) = SecurityIdentifier::parse(s) {
            // Display output parses back to the same identifier
            let reparsed = SecurityIdentifier::parse(&sid.to_string()).unwrap();
            assert_eq!(sid, reparsed);
            let _ = derive_identity(&sid, 200_000);
        }
    }

    if let Some(sid) = SecurityIdentifier::from_bytes(data) {
        let decoded = SecurityIdentifier::from_bytes(&sid.to_bytes()).unwrap();
        assert_eq!(sid, decoded);
        assert_eq!(sid.rid(), *sid.sub_authorities().last().unwrap());
    }
});
