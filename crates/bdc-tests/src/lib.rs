//! Shared fixtures for the integration tests and benches.
//!
//! Recordings are generated deterministically (no RNG) so that snapshots
//! and benchmark inputs are stable across runs.

use std::fmt::Write as _;

use bdc_types::{Record, TEMPERATURE_INVALID, TIME_INVALID};
use bdc_wire::BitWriter;

/// Start of every generated recording (2023-11-14T22:13:20Z).
pub const EPOCH: u32 = 1_700_000_000;

/// A smooth core-temperature curve: `n` samples, one every `period`
/// seconds, oscillating between roughly 36.5 and 38.0 °C.
#[must_use]
pub fn body_curve(n: u32, period: u16) -> Vec<Record> {
    (0..n)
        .map(|i| {
            // triangle wave with a 300-sample half period
            let phase = i % 600;
            let offset = if phase < 300 { phase / 2 } else { (600 - phase) / 2 };
            let temperature = 3650 + i16::try_from(offset).unwrap_or(0);
            Record::new(EPOCH + i * u32::from(period), temperature)
        })
        .collect()
}

/// `body_curve` with the damage a real BLE link produces: runs of
/// unreceived samples, a few samples with a lost timestamp, sensor error
/// markers, jittered timestamps and a clock jump.
#[must_use]
pub fn field_recording(n: u32, period: u16) -> Vec<Record> {
    let mut records = body_curve(n, period);
    for (i, r) in records.iter_mut().enumerate() {
        match i % 97 {
            10..=25 => *r = Record::unreceived(),
            40 => r.time = TIME_INVALID,
            55 => r.temperature = TEMPERATURE_INVALID,
            60 => r.time += 1,
            70 => r.time -= 1,
            80 => r.time += 90,
            _ => {}
        }
    }
    // clock jump: every valid time from the middle on moves a day ahead
    for r in records.iter_mut().skip(n as usize / 2) {
        if r.has_valid_time() {
            r.time += 86_400;
        }
    }
    records
}

/// Pack `(value, nb_bits)` fields into a frame padded with 1-bits.
///
/// # Panics
///
/// If the fields do not fit in 8191 bytes.
#[must_use]
pub fn frame_from_fields(fields: &[(u32, u8)]) -> Vec<u8> {
    let mut writer = BitWriter::new(8191);
    for &(value, nb_bits) in fields {
        assert!(writer.put_bits(value, nb_bits), "field does not fit");
    }
    writer.commit(0);
    writer.pad_last_byte();
    writer.into_bytes()
}

/// One line per record: time (or `?`) and °C (or `error`), or
/// `unreceived`.
#[must_use]
pub fn render(records: &[Record]) -> String {
    let mut out = String::new();
    for r in records {
        if r.is_unreceived() {
            out.push_str("unreceived\n");
            continue;
        }
        if r.has_valid_time() {
            let _ = write!(out, "{} ", r.time);
        } else {
            out.push_str("? ");
        }
        match r.celsius() {
            Some(c) => {
                let _ = writeln!(out, "{c:.2}");
            }
            None => out.push_str("error\n"),
        }
    }
    out
}
