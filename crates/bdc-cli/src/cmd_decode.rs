/// Implementation of `bdc decode`.
///
/// Decompresses a capsule or a bare frame (the format is detected from
/// the leading magic) and writes the records as CSV or JSON.
///
/// # CSV output
///
/// ```text
/// time,temperature,celsius
/// 1700000000,3712,37.12
/// ,3713,37.13            ← invalid timestamp
/// 1700000060,,           ← sensor error
/// ,,                     ← unreceived
/// ```
///
/// # JSON output
///
/// A manifest object (`{"records": [...]}`) that `bdc encode` reads back.
///
/// With `--stream` the capsule is read through `StreamingDecoder`, one
/// frame at a time; the output is identical.
use std::fmt::Write as _;
use std::fs;
use std::io::{Read, Write as _};

use anyhow::{Context, Result, bail};
use bdc_decoder::{
    DecoderConfig, DecoderEvent, Format, StreamingDecoder, detect_format, uncompress_with_config,
};
use bdc_types::Record;
use bdc_wire::header::HEADER_SIZE;
use tracing::info;

use crate::manifest::{Manifest, ManifestRecord};
use crate::{DecodeArgs, OutputFormat};

/// Run the `bdc decode` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or decoded, or the
/// output cannot be written.
pub fn run(args: &DecodeArgs) -> Result<()> {
    let config = DecoderConfig {
        verify_checksum: !args.no_verify,
        ..DecoderConfig::default()
    };

    let records = if args.stream {
        decode_streaming(args, config)?
    } else {
        let bytes =
            fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
        uncompress_with_config(&bytes, &config)
            .with_context(|| format!("failed to decode {}", args.file.display()))?
    };

    let rendered = match args.format {
        OutputFormat::Csv => render_csv(&records),
        OutputFormat::Json => render_json(&records)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered.as_bytes())
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        }
        None => {
            std::io::stdout()
                .lock()
                .write_all(rendered.as_bytes())
                .context("cannot write to stdout")?;
        }
    }

    Ok(())
}

fn decode_streaming(args: &DecodeArgs, config: DecoderConfig) -> Result<Vec<Record>> {
    let mut head = Vec::with_capacity(HEADER_SIZE);
    fs::File::open(&args.file)
        .and_then(|file| file.take(HEADER_SIZE as u64).read_to_end(&mut head))
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let format = detect_format(&head);
    if format != Format::Capsule {
        bail!("--stream needs a capsule, {} is {format:?}", args.file.display());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;

    runtime.block_on(async {
        let file = tokio::fs::File::open(&args.file)
            .await
            .with_context(|| format!("cannot open {}", args.file.display()))?;
        let mut stream = StreamingDecoder::with_config(tokio::io::BufReader::new(file), config);

        let mut records = Vec::new();
        while let Some(event) = stream.next().await {
            match event.with_context(|| format!("failed to decode {}", args.file.display()))? {
                DecoderEvent::Header(header) => {
                    info!(flags = header.flags.raw(), "capsule header");
                }
                DecoderEvent::Frame { index, records: frame } => {
                    info!(index, samples = frame.len(), "frame");
                    records.extend(frame);
                }
                DecoderEvent::Verified { samples } => {
                    info!(samples, "checksum verified");
                }
                DecoderEvent::Trailer { samples } => {
                    info!(samples, "checksum not verified");
                }
            }
        }
        Ok::<_, anyhow::Error>(records)
    })
}

fn render_csv(records: &[Record]) -> String {
    let mut out = String::with_capacity(24 * (records.len() + 1));
    out.push_str("time,temperature,celsius\n");
    for record in records {
        let row = ManifestRecord::from(record);
        let _ = writeln!(
            out,
            "{},{},{}",
            row.time.map(|t| t.to_string()).unwrap_or_default(),
            row.temperature.map(|t| t.to_string()).unwrap_or_default(),
            row.celsius.map(|c| format!("{c:.2}")).unwrap_or_default(),
        );
    }
    out
}

fn render_json(records: &[Record]) -> Result<String> {
    let manifest = Manifest {
        period: None,
        records: records.iter().map(ManifestRecord::from).collect(),
    };
    let mut json = serde_json::to_string_pretty(&manifest).context("cannot serialize records")?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdc_types::{TEMPERATURE_INVALID, TIME_INVALID};

    #[test]
    fn csv_leaves_missing_fields_empty() {
        let csv = render_csv(&[
            Record::new(1_700_000_000, 3712),
            Record::new(TIME_INVALID, 3713),
            Record::new(1_700_000_060, TEMPERATURE_INVALID),
            Record::unreceived(),
        ]);
        assert_eq!(
            csv,
            "time,temperature,celsius\n\
             1700000000,3712,37.12\n\
             ,3713,37.13\n\
             1700000060,,\n\
             ,,\n"
        );
    }

    #[test]
    fn json_is_a_manifest() {
        let json = render_json(&[Record::new(5, 100), Record::unreceived()]).unwrap();
        let manifest: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest.records.len(), 2);
        assert!(manifest.records[1].unreceived);
    }
}
