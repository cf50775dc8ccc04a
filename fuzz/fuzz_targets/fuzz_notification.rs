//! Fuzz target: `extract_subscribe_payload`
//!
//! Any line either yields a payload that is a strict sub-slice of the
//! input or is reported as malformed; it never panics.
//!
//! cargo fuzz run fuzz_notification

#![no_main]

use libfuzzer_sys::fuzz_target;
use ltebridge::modem::payload::extract_subscribe_payload;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(payload) = extract_subscribe_payload(line) {
        assert!(line.starts_with("+QMTRECV: 0"));
        assert!(payload.len() + 2 <= line.len());
        assert!(line.ends_with('"'));
    }
});
