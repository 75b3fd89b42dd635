#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use bdc_decoder::CapsuleDecoder;
use bdc_encoder::CapsuleEncoder;
use bdc_types::{Record, MAX_DIRECT_TEMPERATURE, TEMPERATURE_INVALID, TIME_INVALID};

#[derive(Debug, Arbitrary)]
enum FuzzSample {
    Valid { step: i16, temperature: u16 },
    InvalidTime { temperature: u16 },
    SensorError { step: i16 },
    Unreceived { count: u8 },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    start: u32,
    period: u16,
    frame_capacity: u16,
    checksum: bool,
    samples: Vec<FuzzSample>,
}

fn temperature(raw: u16) -> i16 {
    (raw % (MAX_DIRECT_TEMPERATURE as u16 + 1)) as i16
}

// Fuzz target: CapsuleEncoder -> CapsuleDecoder roundtrip.
//
// Builds recordings with arbitrary jitter, gaps and error markers. Every
// recording the encoder accepts must decode to exactly the same records.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };

    let mut time = input.start;
    let mut records = Vec::new();
    for sample in input.samples.iter().take(512) {
        match *sample {
            FuzzSample::Valid { step, temperature: t } => {
                time = time.wrapping_add_signed(i32::from(step));
                if time != TIME_INVALID {
                    records.push(Record::new(time, temperature(t)));
                }
            }
            FuzzSample::InvalidTime { temperature: t } => {
                records.push(Record::new(TIME_INVALID, temperature(t)));
            }
            FuzzSample::SensorError { step } => {
                time = time.wrapping_add_signed(i32::from(step));
                if time != TIME_INVALID {
                    records.push(Record::new(time, TEMPERATURE_INVALID));
                }
            }
            FuzzSample::Unreceived { count } => {
                records.extend(std::iter::repeat(Record::unreceived()).take(usize::from(count)));
            }
        }
    }

    let mut encoder = CapsuleEncoder::new();
    encoder
        .period(input.period)
        .frame_capacity(usize::from(input.frame_capacity))
        .checksum(input.checksum)
        .add_records(records.clone());

    let Ok(capsule) = encoder.encode() else {
        return;
    };

    let decoded = CapsuleDecoder::decode(&capsule);
    assert!(decoded.is_ok(), "decoder failed on valid encoder output: {:?}", decoded.err());
    assert_eq!(decoded.unwrap().records, records);
});
