//! Fuzz target: scanner datagram decoding.
//!
//! Any byte string must decode or return a `ScannerError` without
//! panicking.  A decoded id carries no surrounding whitespace.
//!
//! cargo fuzz run fuzz_scanner_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermalctl::scanner::parse_frame;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = parse_frame(data) {
        assert_eq!(frame.scanner_id, frame.scanner_id.trim());
        assert!(data.len() >= frame.readings.len());
    }
});
