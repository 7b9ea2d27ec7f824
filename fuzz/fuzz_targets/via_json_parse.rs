//! Fuzz target for polygon-JSON annotation parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the region-JSON parser,
//! checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use yoloprep::convert::via_json::fuzz_parse_via_str;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = fuzz_parse_via_str(text);
    }
});
