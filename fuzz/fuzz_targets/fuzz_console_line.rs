//! Fuzz target: console command parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermalctl::adapters::console::parse_line;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(payload) = parse_line(line) {
        // Every parsed line names a real protocol command.
        assert!(!payload.kind().name().is_empty());
    }
});
