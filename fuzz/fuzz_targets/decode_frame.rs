#![no_main]

use libfuzzer_sys::fuzz_target;
use bdc_decoder::{DecoderConfig, FrameDecoder};

// Fuzz target: FrameDecoder::decode on arbitrary bit streams.
//
// Catches bugs in:
// - Escape chains cut off by the end of the frame
// - Unreceived runs expanding past the sample limit
// - Deltas with no timestamp or temperature reference
// - Wrapping timestamp arithmetic
fuzz_target!(|data: &[u8]| {
    let config = DecoderConfig {
        max_samples: 4096,
        ..DecoderConfig::default()
    };
    let mut decoder = FrameDecoder::with_config(config);
    if let Ok(records) = decoder.decode(data) {
        assert!(!records.is_empty());
        assert!(records.len() <= 4096);
    }
    // the temperature reference survives into the next frame
    let _ = decoder.decode(data);
});
