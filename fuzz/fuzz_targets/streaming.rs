#![no_main]

use libfuzzer_sys::fuzz_target;
use bdc_decoder::{CapsuleDecoder, DecoderConfig, DecoderEvent, StreamingDecoder};

// Fuzz target: StreamingDecoder against CapsuleDecoder.
//
// Both decoders must accept and reject the same inputs, and produce the
// same records when they accept.
fuzz_target!(|data: &[u8]| {
    let config = DecoderConfig {
        max_samples: 4096,
        ..DecoderConfig::default()
    };
    let sync = CapsuleDecoder::decode_with_config(data, &config);

    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let streamed = runtime.block_on(async {
        let mut stream = StreamingDecoder::with_config(data, config.clone());
        let mut records = Vec::new();
        while let Some(event) = stream.next().await {
            match event {
                Ok(DecoderEvent::Frame { records: frame, .. }) => records.extend(frame),
                Ok(_) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    });

    match (sync, streamed) {
        (Ok(decoded), Ok(records)) => assert_eq!(decoded.records, records),
        (Err(_), Err(_)) => {}
        (sync, streamed) => panic!(
            "decoders disagree: sync ok={}, streaming ok={}",
            sync.is_ok(),
            streamed.is_ok()
        ),
    }
});
