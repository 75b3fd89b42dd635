/// Implementation of `bdc validate`.
///
/// Fully decodes the input and reports either a series of checkmarks
/// (`✓`) or one diagnostic line (`✗`). Exits with code 1 on any error.
///
/// # Success output
///
/// ```text
/// ✓ Header: valid (BDC v1.0)
/// ✓ Frames: 6 frames, 4320 samples
/// ✓ End marker: present
/// ✓ Checksum: 4320 samples, blake3 3f1a…c9d2
/// ```
///
/// A bare frame has no container, so only the frame line is printed:
///
/// ```text
/// ✓ Raw frame: 51 bytes, 120 samples
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error: checksum mismatch: trailer 3f1a…c9d2, records 77b0…01e4
/// ```
use std::fs;

use anyhow::{Context, Result, anyhow};
use bdc_decoder::{CapsuleDecoder, DecodeError, Format, detect_format, uncompress};

use crate::ValidateArgs;

/// Run the `bdc validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    check(&bytes).map_err(|e| {
        println!("✗ Error: {}", decode_error_diagnostic(&e));
        anyhow!("validation failed")
    })
}

/// Decode `bytes` in full, printing a checkmark line per verified part.
fn check(bytes: &[u8]) -> Result<(), DecodeError> {
    match detect_format(bytes) {
        Format::Empty => Err(DecodeError::EmptyInput),
        Format::RawFrame => uncompress(bytes).map(|records| {
            println!("✓ Raw frame: {} bytes, {} samples", bytes.len(), records.len());
        }),
        Format::Capsule => CapsuleDecoder::decode(bytes).map(|decoded| {
            let header = &decoded.header;
            println!(
                "✓ Header: valid (BDC v{}.{})",
                header.version_major, header.version_minor
            );
            println!(
                "✓ Frames: {} frame{}, {} samples",
                decoded.frames.len(),
                if decoded.frames.len() == 1 { "" } else { "s" },
                decoded.records.len()
            );
            println!("✓ End marker: present");
            match decoded.checksum {
                Some(checksum) => println!(
                    "✓ Checksum: {} samples, blake3 {}",
                    decoded.records.len(),
                    short_hex(&checksum)
                ),
                None => println!("- Checksum: none"),
            }
        }),
    }
}

// ── Error formatting ──────────────────────────────────────────────────────────

/// Converts a `DecodeError` into a one-line diagnostic.
///
/// ```text
/// ┌──────────────────────┬──────────────────────────────────────────┐
/// │ DecodeError variant  │ Diagnostic message prefix                │
/// ├──────────────────────┼──────────────────────────────────────────┤
/// │ InvalidHeader        │ "invalid header: <inner error>"          │
/// │ MissingEndMarker     │ "missing end-of-frames marker"           │
/// │ ChecksumMismatch     │ "checksum mismatch: trailer …, records …"│
/// │ TrailingData         │ "trailing data after capsule (n bytes)"  │
/// │ anything else        │ "<error Display>"                        │
/// └──────────────────────┴──────────────────────────────────────────┘
/// ```
fn decode_error_diagnostic(e: &DecodeError) -> String {
    match e {
        DecodeError::InvalidHeader(inner) => format!("invalid header: {inner}"),
        DecodeError::MissingEndMarker => "missing end-of-frames marker".to_string(),
        DecodeError::ChecksumMismatch { expected, actual } => format!(
            "checksum mismatch: trailer {}, records {}",
            short_hex(expected),
            short_hex(actual)
        ),
        DecodeError::TrailingData { extra_bytes } => {
            format!("trailing data after capsule ({extra_bytes} unexpected bytes)")
        }
        other => other.to_string(),
    }
}

/// First and last four bytes of a digest.
fn short_hex(digest: &[u8; 32]) -> String {
    format!("{}…{}", hex::encode(&digest[..4]), hex::encode(&digest[28..]))
}
