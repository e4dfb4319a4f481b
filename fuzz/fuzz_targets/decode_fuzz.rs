#![no_main]
use libfuzzer_sys::fuzz_target;
use lzmatch::codec::Format;

fuzz_target!(|data: &[u8]| {
    // Decoders must reject garbage with an error, never a panic.
    for format in Format::ALL {
        let _ = format.decompress(data);
    }
});
