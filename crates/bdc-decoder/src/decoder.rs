use bdc_types::{DIGEST_SIZE, Record, RecordDigest};
use bdc_wire::header::{HEADER_SIZE, MAX_FRAME_LEN};
use bdc_wire::varint::decode_varint;
use bdc_wire::{CapsuleHeader, Trailer, WireError};
use tracing::debug;

use crate::config::DecoderConfig;
use crate::detect::{Format, detect_format};
use crate::error::DecodeError;
use crate::frame::FrameDecoder;

/// Where a frame sat in the capsule and what it produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    /// Byte offset of the frame's bitstream (after its length varint).
    pub offset: usize,
    pub len: usize,
    pub samples: usize,
}

/// The result of decoding a capsule.
///
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │ DecodedCapsule                                       │
/// │   header:   CapsuleHeader      ← version, flags      │
/// │   frames:   Vec<FrameSummary>  ← one per frame       │
/// │   records:  Vec<Record>        ← all frames, in order│
/// │   checksum: Option<[u8; 32]>   ← trailer digest      │
/// └──────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug)]
pub struct DecodedCapsule {
    pub header: CapsuleHeader,
    pub frames: Vec<FrameSummary>,
    pub records: Vec<Record>,

    /// Digest stored in the trailer, when the capsule has one. It has
    /// been checked against `records` unless verification was disabled.
    pub checksum: Option<[u8; DIGEST_SIZE]>,
}

/// Synchronous capsule decoder, the inverse of `CapsuleEncoder::encode`
/// from the `bdc-encoder` crate.
///
/// Decoding proceeds in four steps:
///
///   1. **Header**: validate the 8-byte capsule header.
///   2. **Frames**: read `varint length + bitstream` pairs and run each
///      through one shared [`FrameDecoder`] until the zero-length end
///      marker.
///   3. **Trailer**: if `HAS_CHECKSUM` is set, read the sample count and
///      BLAKE3 digest and compare them with what was decoded.
///   4. **Termination**: report any bytes left after the capsule.
///
/// # Example
///
/// ```rust
/// use bdc_decoder::CapsuleDecoder;
/// use bdc_encoder::CapsuleEncoder;
/// use bdc_types::Record;
///
/// let capsule = CapsuleEncoder::new()
///     .period(60)
///     .add_record(Record::new(1_000, 3700))
///     .add_record(Record::new(1_060, 3702))
///     .encode()
///     .unwrap();
///
/// let decoded = CapsuleDecoder::decode(&capsule).unwrap();
/// assert_eq!(decoded.records.len(), 2);
/// assert!(decoded.checksum.is_some());
/// ```
pub struct CapsuleDecoder;

impl CapsuleDecoder {
    /// Decode a complete capsule with the default configuration.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidHeader`] if the header fails validation.
    /// - [`DecodeError::FrameTooLarge`] if a frame length exceeds
    ///   [`MAX_FRAME_LEN`].
    /// - [`DecodeError::MissingEndMarker`] if the input ends before the
    ///   end-of-frames marker.
    /// - [`DecodeError::NoSamples`] / [`DecodeError::TooManySamples`] from
    ///   a frame.
    /// - [`DecodeError::SampleCountMismatch`] /
    ///   [`DecodeError::ChecksumMismatch`] if the trailer disagrees.
    /// - [`DecodeError::TrailingData`] if bytes follow the capsule.
    /// - [`DecodeError::Wire`] for truncated lengths or trailer.
    pub fn decode(capsule: &[u8]) -> Result<DecodedCapsule, DecodeError> {
        Self::decode_with_config(capsule, &DecoderConfig::default())
    }

    /// Decode a complete capsule with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode). With `verify_checksum` off the
    /// two mismatch errors are never returned.
    pub fn decode_with_config(
        capsule: &[u8],
        config: &DecoderConfig,
    ) -> Result<DecodedCapsule, DecodeError> {
        let header = CapsuleHeader::read_from(capsule).map_err(DecodeError::InvalidHeader)?;
        debug!(
            major = header.version_major,
            minor = header.version_minor,
            flags = header.flags.raw(),
            "capsule header"
        );

        let mut decoder = FrameDecoder::with_config(config.clone());
        let mut digest = RecordDigest::new();
        let mut frames = Vec::new();
        let mut records = Vec::new();
        let mut cursor = HEADER_SIZE;

        loop {
            let remaining = &capsule[cursor..];
            if remaining.is_empty() {
                return Err(DecodeError::MissingEndMarker);
            }

            let (len, consumed) = decode_varint(remaining).map_err(|e| match e {
                WireError::UnexpectedEof { .. } => WireError::UnexpectedEof {
                    offset: capsule.len(),
                },
                other => other,
            })?;
            cursor += consumed;

            if len == 0 {
                break;
            }
            let len = frame_len(len, cursor)?;

            let bytes = capsule
                .get(cursor..cursor + len)
                .ok_or(WireError::UnexpectedEof {
                    offset: capsule.len(),
                })?;

            let first = records.len();
            let samples = decoder.decode_with(bytes, |record| records.push(record))?;
            digest.update_all(&records[first..]);

            debug!(index = frames.len(), offset = cursor, len, samples, "frame");
            frames.push(FrameSummary {
                offset: cursor,
                len,
                samples,
            });
            cursor += len;
        }

        let checksum = if header.flags.has_checksum() {
            let (trailer, consumed) = Trailer::read_from(&capsule[cursor..])?;
            cursor += consumed;
            if config.verify_checksum {
                verify(&trailer, &digest)?;
            }
            Some(trailer.checksum)
        } else {
            None
        };

        if cursor < capsule.len() {
            return Err(DecodeError::TrailingData {
                extra_bytes: capsule.len() - cursor,
            });
        }

        Ok(DecodedCapsule {
            header,
            frames,
            records,
            checksum,
        })
    }
}

/// Check a frame length field against [`MAX_FRAME_LEN`].
pub(crate) fn frame_len(len: u64, offset: usize) -> Result<usize, DecodeError> {
    match usize::try_from(len) {
        Ok(n) if n <= MAX_FRAME_LEN => Ok(n),
        _ => Err(DecodeError::FrameTooLarge {
            offset,
            len,
            limit: MAX_FRAME_LEN,
        }),
    }
}

/// Compare a trailer with the digest of the decoded records.
pub(crate) fn verify(trailer: &Trailer, digest: &RecordDigest) -> Result<(), DecodeError> {
    let (actual, count) = digest.finalize();
    if trailer.sample_count != count {
        return Err(DecodeError::SampleCountMismatch {
            expected: trailer.sample_count,
            actual: count,
        });
    }
    if trailer.checksum != actual {
        return Err(DecodeError::ChecksumMismatch {
            expected: trailer.checksum,
            actual,
        });
    }
    Ok(())
}

/// Decompress `input`, whatever its shape.
///
/// Capsules are decoded in full (and verified); anything else is
/// decoded as a single bare frame.
///
/// # Errors
///
/// [`DecodeError::EmptyInput`] for zero bytes, otherwise the errors of
/// [`CapsuleDecoder::decode`] or [`FrameDecoder::decode`].
pub fn uncompress(input: &[u8]) -> Result<Vec<Record>, DecodeError> {
    uncompress_with_config(input, &DecoderConfig::default())
}

/// [`uncompress`] with an explicit configuration.
///
/// # Errors
///
/// Same as [`uncompress`], plus [`DecodeError::FrameTooLarge`] for a bare
/// frame longer than [`MAX_FRAME_LEN`].
pub fn uncompress_with_config(
    input: &[u8],
    config: &DecoderConfig,
) -> Result<Vec<Record>, DecodeError> {
    match detect_format(input) {
        Format::Empty => Err(DecodeError::EmptyInput),
        Format::Capsule => Ok(CapsuleDecoder::decode_with_config(input, config)?.records),
        Format::RawFrame => {
            if input.len() > MAX_FRAME_LEN {
                return Err(DecodeError::FrameTooLarge {
                    offset: 0,
                    len: input.len() as u64,
                    limit: MAX_FRAME_LEN,
                });
            }
            FrameDecoder::with_config(config.clone()).decode(input)
        }
    }
}
