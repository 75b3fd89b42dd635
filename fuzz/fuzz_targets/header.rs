#![no_main]

use libfuzzer_sys::fuzz_target;
use bdc_wire::header::{CapsuleHeader, HEADER_SIZE};

// Fuzz target: CapsuleHeader::read_from with arbitrary bytes.
//
// Catches bugs in:
// - Magic byte validation
// - Version checking
// - Unknown flag bits and reserved byte enforcement
// - Truncated header handling
fuzz_target!(|data: &[u8]| {
    if let Ok(header) = CapsuleHeader::read_from(data) {
        let mut buf = [0u8; HEADER_SIZE];
        header.write_to(&mut buf).unwrap();
        assert_eq!(&buf[..], &data[..HEADER_SIZE]);
    }
});
