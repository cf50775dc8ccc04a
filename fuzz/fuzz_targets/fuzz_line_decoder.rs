//! Fuzz target: `LineDecoder::push`
//!
//! Drives arbitrary byte sequences into the response line decoder and
//! asserts that it never panics, never yields an empty or over-capacity
//! line, and recovers cleanly after a reset.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use ltebridge::link::LineDecoder;
use ltebridge::link::lines::LINE_CAPACITY;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &b in data {
        if let Some(line) = decoder.push(b) {
            assert!(!line.is_empty(), "decoder must not yield empty lines");
            assert!(line.len() <= LINE_CAPACITY);
            assert!(!line.contains('\r'));
        }
    }

    // After a reset a plain result code must decode.
    decoder.reset();
    let line = b"0\r".iter().find_map(|&b| decoder.push(b));
    assert_eq!(line.as_deref(), Some("0"));
});
