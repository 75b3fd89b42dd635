use std::io::Write;

use bdc_types::codes::PERIOD_NONE;
use bdc_types::{Record, RecordDigest};
use bdc_wire::header::HEADER_SIZE;
use bdc_wire::varint::encode_varint;
use bdc_wire::{CapsuleFlags, CapsuleHeader, Trailer};
use tracing::debug;

use crate::error::EncodeError;
use crate::frame::FrameEncoder;

/// Default frame size: one BLE notification payload.
pub const DEFAULT_FRAME_CAPACITY: usize = 244;

/// Capsule encoder: splits records into frames and wraps them in a
/// container file.
///
/// Records are accumulated with [`add_record`](Self::add_record) /
/// [`add_records`](Self::add_records) and compressed in one go by
/// [`encode`](Self::encode). Consecutive unreceived placeholders are
/// coalesced into runs, which is what makes gaps in a recording nearly
/// free.
///
/// # Usage
///
/// ```rust
/// use bdc_encoder::CapsuleEncoder;
/// use bdc_types::Record;
///
/// let capsule = CapsuleEncoder::new()
///     .period(30)
///     .add_record(Record::new(1_700_000_000, 3712))
///     .add_record(Record::unreceived())
///     .add_record(Record::new(1_700_000_060, 3715))
///     .encode()
///     .unwrap();
/// assert!(capsule.starts_with(b"BDC\0"));
/// ```
///
/// # Output layout
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────┐
/// │ [8 bytes]    │ Header (magic, version, flags, rsv)      │
/// │ varint + N   │ Frame 0                                  │
/// │ varint + N   │ Frame 1 ...                              │
/// │ [1 byte]     │ End of frames (varint 0)                 │
/// │ varint + 32  │ Sample count + BLAKE3 (if checksum)      │
/// └──────────────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug)]
pub struct CapsuleEncoder {
    records: Vec<Record>,
    frame_capacity: usize,
    period: u16,
    checksum: bool,
}

impl CapsuleEncoder {
    /// Create an encoder with [`DEFAULT_FRAME_CAPACITY`]-byte frames, no
    /// period and a checksum trailer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            period: PERIOD_NONE,
            checksum: true,
        }
    }

    /// Maximum size of each frame in bytes. Checked by
    /// [`encode`](Self::encode).
    pub fn frame_capacity(&mut self, capacity: usize) -> &mut Self {
        self.frame_capacity = capacity;
        self
    }

    /// Nominal sampling period in seconds, written at the start of every
    /// frame.
    pub fn period(&mut self, period: u16) -> &mut Self {
        self.period = period;
        self
    }

    /// Whether to append the sample count and BLAKE3 digest trailer.
    pub fn checksum(&mut self, enabled: bool) -> &mut Self {
        self.checksum = enabled;
        self
    }

    pub fn add_record(&mut self, record: Record) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn add_records(&mut self, records: impl IntoIterator<Item = Record>) -> &mut Self {
        self.records.extend(records);
        self
    }

    /// Compress the accumulated records into frames, without the
    /// container.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::EmptyPayload`] if no records have been added.
    /// - [`EncodeError::FrameCapacity`] if the frame capacity is out of
    ///   range.
    /// - [`EncodeError::TemperatureOutOfRange`] for an unencodable record.
    pub fn encode_frames(&self) -> Result<Vec<Vec<u8>>, EncodeError> {
        if self.records.is_empty() {
            return Err(EncodeError::EmptyPayload);
        }

        let mut frames = Vec::new();
        let mut frame = self.new_frame()?;
        let mut i = 0;

        while i < self.records.len() {
            let run = self.records[i..]
                .iter()
                .take_while(|r| r.is_unreceived())
                .count();

            let written = if run > 0 {
                frame.push_unreceived(run)
            } else {
                usize::from(frame.push(&self.records[i])?)
            };
            i += written;

            if written < run.max(1) {
                debug!(index = frames.len(), samples = frame.samples(), "frame full");
                let full = std::mem::replace(&mut frame, self.new_frame()?);
                frames.push(full.finish());
            }
        }

        if !frame.is_empty() {
            frames.push(frame.finish());
        }
        Ok(frames)
    }

    /// Serialize everything into a capsule.
    ///
    /// # Errors
    ///
    /// Same as [`encode_frames`](Self::encode_frames), plus
    /// [`EncodeError::Wire`] if the header cannot be written.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let frames = self.encode_frames()?;

        let flags = if self.checksum {
            CapsuleFlags::HAS_CHECKSUM
        } else {
            CapsuleFlags::NONE
        };

        let estimated = HEADER_SIZE + frames.iter().map(|f| f.len() + 2).sum::<usize>() + 64;
        let mut output = Vec::with_capacity(estimated);
        output.resize(HEADER_SIZE, 0);
        CapsuleHeader::new(flags).write_to(&mut output[..HEADER_SIZE])?;

        for frame in &frames {
            encode_varint(frame.len() as u64, &mut output);
            output.extend_from_slice(frame);
        }
        encode_varint(0, &mut output);

        if self.checksum {
            let mut digest = RecordDigest::new();
            digest.update_all(&self.records);
            let (checksum, sample_count) = digest.finalize();
            Trailer {
                sample_count,
                checksum,
            }
            .write_to(&mut output);
        }

        debug!(
            records = self.records.len(),
            frames = frames.len(),
            bytes = output.len(),
            "capsule encoded"
        );
        Ok(output)
    }

    /// [`encode`](Self::encode) straight into a writer. Returns the number
    /// of bytes written.
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode), plus [`EncodeError::Io`] if the
    /// write fails.
    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<usize, EncodeError> {
        let bytes = self.encode()?;
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    fn new_frame(&self) -> Result<FrameEncoder, EncodeError> {
        FrameEncoder::with_period(self.frame_capacity, self.period)
    }
}

impl Default for CapsuleEncoder {
    fn default() -> Self {
        Self::new()
    }
}
