#![no_main]

use libfuzzer_sys::fuzz_target;
use bdc_wire::Trailer;

// Fuzz target: Trailer::read_from with arbitrary bytes.
//
// A parsed trailer must serialize back to exactly the bytes it consumed.
fuzz_target!(|data: &[u8]| {
    if let Ok((trailer, consumed)) = Trailer::read_from(data) {
        let mut wire = Vec::new();
        let written = trailer.write_to(&mut wire);
        assert_eq!(written, wire.len());
        // overlong varints parse but do not reproduce
        if written == consumed {
            assert_eq!(&wire[..], &data[..consumed]);
        }
    }
});
