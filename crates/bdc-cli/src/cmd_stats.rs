/// Implementation of `bdc stats`.
///
/// Decodes a capsule or bare frame and prints sample counts by kind, the
/// covered time span, temperature extremes and the compression ratio
/// against the 6-byte canonical record size.
///
/// # Example output
///
/// ```text
/// File:    /tmp/day1.bdc  (1204 bytes, capsule)
/// Frames:  6
///
/// Samples            Count
/// ────────────────────────
/// valid               4290
/// invalid time          12
/// sensor error           3
/// unreceived            15
/// ────────────────────────
/// Total               4320
///
/// Time span:    1700000000..1700259140 (72.0 h)
/// Temperature:  min 36.41 °C, max 38.02 °C, mean 37.12 °C
/// Compression:  25920 → 1204 bytes (21.5×)
/// ```
use std::fs;

use anyhow::{Context, Result};
use bdc_decoder::{CapsuleDecoder, DecodeError, Format, detect_format, uncompress};
use bdc_types::Record;

use crate::StatsArgs;

/// Aggregated figures over a record list.
#[derive(Debug, Default, PartialEq)]
struct Summary {
    valid: usize,
    invalid_time: usize,
    sensor_error: usize,
    unreceived: usize,
    first_time: Option<u32>,
    last_time: Option<u32>,
    min_celsius: Option<f64>,
    max_celsius: Option<f64>,
    sum_celsius: f64,
    with_celsius: usize,
}

impl Summary {
    fn of(records: &[Record]) -> Self {
        let mut s = Self::default();
        for r in records {
            if r.is_unreceived() {
                s.unreceived += 1;
                continue;
            }

            if r.has_valid_time() {
                s.first_time.get_or_insert(r.time);
                s.last_time = Some(r.time);
            } else {
                s.invalid_time += 1;
            }

            match r.celsius() {
                Some(c) => {
                    s.min_celsius = Some(s.min_celsius.map_or(c, |m| m.min(c)));
                    s.max_celsius = Some(s.max_celsius.map_or(c, |m| m.max(c)));
                    s.sum_celsius += c;
                    s.with_celsius += 1;
                }
                None => s.sensor_error += 1,
            }

            if r.has_valid_time() && r.has_valid_temperature() {
                s.valid += 1;
            }
        }
        s
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean_celsius(&self) -> Option<f64> {
        (self.with_celsius > 0).then(|| self.sum_celsius / self.with_celsius as f64)
    }
}

/// Records and frame count of a capsule or bare frame.
fn decode_input(format: Format, bytes: &[u8]) -> Result<(Vec<Record>, usize), DecodeError> {
    match format {
        Format::Empty => Err(DecodeError::EmptyInput),
        Format::Capsule => {
            let decoded = CapsuleDecoder::decode(bytes)?;
            let frames = decoded.frames.len();
            Ok((decoded.records, frames))
        }
        Format::RawFrame => Ok((uncompress(bytes)?, 1)),
    }
}

/// Run the `bdc stats` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn run(args: &StatsArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let format = detect_format(&bytes);
    let (records, frames) = decode_input(format, &bytes)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    let summary = Summary::of(&records);
    let kind = if format == Format::Capsule { "capsule" } else { "raw frame" };

    println!("File:    {}  ({} bytes, {kind})", args.file.display(), bytes.len());
    println!("Frames:  {frames}");
    println!();
    println!("{:<16} {:>7}", "Samples", "Count");
    println!("{}", "─".repeat(24));
    println!("{:<16} {:>7}", "valid", summary.valid);
    println!("{:<16} {:>7}", "invalid time", summary.invalid_time);
    println!("{:<16} {:>7}", "sensor error", summary.sensor_error);
    println!("{:<16} {:>7}", "unreceived", summary.unreceived);
    println!("{}", "─".repeat(24));
    println!("{:<16} {:>7}", "Total", records.len());
    println!();

    if let (Some(first), Some(last)) = (summary.first_time, summary.last_time) {
        let hours = f64::from(last.wrapping_sub(first)) / 3600.0;
        println!("Time span:    {first}..{last} ({hours:.1} h)");
    }
    if let (Some(min), Some(max), Some(mean)) =
        (summary.min_celsius, summary.max_celsius, summary.mean_celsius())
    {
        println!("Temperature:  min {min:.2} °C, max {max:.2} °C, mean {mean:.2} °C");
    }

    let raw = records.len() * 6;
    #[allow(clippy::cast_precision_loss)]
    let ratio = raw as f64 / bytes.len() as f64;
    println!("Compression:  {raw} → {} bytes ({ratio:.1}×)", bytes.len());

    Ok(())
}
