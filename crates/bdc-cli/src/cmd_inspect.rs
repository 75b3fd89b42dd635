/// Implementation of `bdc inspect`.
///
/// Decodes a capsule and prints one line per frame: where it sits, how
/// big it is, how many samples it holds and the time range they cover.
///
/// # Output format
///
/// ```text
/// Header: BDC v1.0, flags=0x01 (checksum), 3 frames
/// Frame 0: offset 9, 244 bytes, 612 samples, t=1700000000..1700036660
/// Frame 1: offset 255, 244 bytes, 598 samples, t=1700036720..1700072600
/// Frame 2: offset 501, 37 bytes, 80 samples, t=1700072660..1700077400
/// ---
/// Checksum: 1290 samples, blake3 3f1ac04e…
/// ```
use std::fs;

use anyhow::{Context, Result, bail};
use bdc_decoder::{CapsuleDecoder, Format, FrameSummary, detect_format};
use bdc_types::Record;

use crate::InspectArgs;

/// Run the `bdc inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a capsule, or is
/// structurally invalid.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    if detect_format(&bytes) != Format::Capsule {
        bail!(
            "{} is not a capsule; use `bdc decode` for bare frames",
            args.file.display()
        );
    }

    let decoded = CapsuleDecoder::decode(&bytes)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    let header = &decoded.header;
    println!(
        "Header: BDC v{}.{}, flags=0x{:02X}{}, {} frame{}",
        header.version_major,
        header.version_minor,
        header.flags.raw(),
        if header.flags.has_checksum() { " (checksum)" } else { "" },
        decoded.frames.len(),
        if decoded.frames.len() == 1 { "" } else { "s" }
    );

    let mut first = 0;
    for (idx, frame) in decoded.frames.iter().enumerate() {
        let records = &decoded.records[first..first + frame.samples];
        first += frame.samples;

        if let Some(target) = args.frame
            && idx != target
        {
            continue;
        }

        println!(
            "Frame {idx}: offset {}, {} bytes, {} samples{}",
            frame.offset,
            frame.len,
            frame.samples,
            time_range(records)
        );

        if args.show_hex {
            hex_dump(&bytes, frame);
        }
    }

    println!("---");
    match decoded.checksum {
        Some(checksum) => println!(
            "Checksum: {} samples, blake3 {}",
            decoded.records.len(),
            hex::encode(checksum)
        ),
        None => println!("No checksum"),
    }

    Ok(())
}

/// `, t=first..last` over the valid timestamps, or nothing when the
/// frame has none.
fn time_range(records: &[Record]) -> String {
    let mut times = records.iter().filter(|r| r.has_valid_time()).map(|r| r.time);
    match times.next() {
        Some(first) => {
            let last = times.last().unwrap_or(first);
            format!(", t={first}..{last}")
        }
        None => String::new(),
    }
}

fn hex_dump(bytes: &[u8], frame: &FrameSummary) {
    let body = &bytes[frame.offset..frame.offset + frame.len];
    for (i, chunk) in body.chunks(16).enumerate() {
        println!("         {:04x}: {}", i * 16, hex::encode(chunk));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdc_types::TIME_INVALID;

    #[test]
    fn time_range_skips_invalid_times() {
        let records = [
            Record::unreceived(),
            Record::new(100, 1),
            Record::new(TIME_INVALID, 2),
            Record::new(160, 3),
        ];
        assert_eq!(time_range(&records), ", t=100..160");
        assert_eq!(time_range(&[Record::new(7, 0)]), ", t=7..7");
        assert_eq!(time_range(&[Record::unreceived()]), "");
    }
}
