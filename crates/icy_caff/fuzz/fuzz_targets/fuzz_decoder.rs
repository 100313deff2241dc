#![no_main]

use libfuzzer_sys::fuzz_target;
use icy_caff::{caff_decode, ciff_decode};

fuzz_target!(|data: &[u8]| {
    // The decoders should never panic, regardless of input
    let _ = caff_decode(data);
    let _ = ciff_decode(data);
});
