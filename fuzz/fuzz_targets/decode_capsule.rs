#![no_main]

use libfuzzer_sys::fuzz_target;
use bdc_decoder::{CapsuleDecoder, DecoderConfig};

// Fuzz target: CapsuleDecoder on arbitrary bytes.
//
// Catches bugs in:
// - Frame length varints pointing past the input
// - Missing end marker and truncated trailers
// - Summary offsets not matching the frame bytes
fuzz_target!(|data: &[u8]| {
    let config = DecoderConfig {
        max_samples: 4096,
        ..DecoderConfig::default()
    };
    if let Ok(decoded) = CapsuleDecoder::decode_with_config(data, &config) {
        let samples: usize = decoded.frames.iter().map(|f| f.samples).sum();
        assert_eq!(samples, decoded.records.len());
        for frame in &decoded.frames {
            assert!(frame.offset + frame.len <= data.len());
        }
    }
});
