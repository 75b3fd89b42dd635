/// Implementation of `bdc encode`.
///
/// Reads a JSON manifest (see [`crate::manifest`]) and compresses its
/// records into a capsule with `CapsuleEncoder`. The `--period` flag takes
/// precedence over the manifest's `period`.
///
/// # Output
///
/// ```text
/// Wrote 1204 bytes to day1.bdc (4320 records)
/// ```
use std::fs;

use anyhow::{Context, Result};
use bdc_encoder::CapsuleEncoder;
use bdc_types::Record;
use bdc_types::codes::PERIOD_NONE;

use crate::EncodeArgs;
use crate::manifest::Manifest;

/// Run the `bdc encode` command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed, if it holds
/// no records or an unencodable temperature, or if the output cannot be
/// written.
pub fn run(args: &EncodeArgs) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("invalid manifest {}", args.input.display()))?;

    let records: Vec<Record> = manifest.records.iter().map(Record::from).collect();
    let period = args.period.or(manifest.period).unwrap_or(PERIOD_NONE);

    let mut encoder = CapsuleEncoder::new();
    encoder
        .frame_capacity(args.frame_size)
        .period(period)
        .checksum(!args.no_checksum)
        .add_records(records.iter().copied());

    let bytes = encoder.encode().context("failed to encode records")?;

    fs::write(&args.output, &bytes)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    println!(
        "Wrote {} bytes to {} ({} record{})",
        bytes.len(),
        args.output.display(),
        records.len(),
        if records.len() == 1 { "" } else { "s" },
    );
    Ok(())
}
