use bdc_wire::WireError;

/// Errors that can occur while decompressing frames or capsule files.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── EmptyInput             ← nothing to decode
///   ├── InvalidHeader          ← capsule magic, version, flags or reserved byte wrong
///   ├── NoSamples              ← a frame decoded to zero samples
///   ├── TooManySamples         ← a frame expanded past the configured limit
///   ├── FrameTooLarge          ← frame length field exceeds MAX_FRAME_LEN
///   ├── MissingEndMarker       ← capsule ran out before the zero-length marker
///   ├── SampleCountMismatch    ← trailer count differs from decoded count
///   ├── ChecksumMismatch       ← trailer digest differs from decoded records
///   ├── TrailingData           ← bytes left after the capsule
///   ├── Wire(WireError)        ← varint or trailer framing errors
///   └── Io(std::io::Error)     ← from the streaming reader
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("input is empty")]
    EmptyInput,

    /// The 8-byte capsule header failed validation.
    #[error("invalid header: {0}")]
    InvalidHeader(WireError),

    /// A frame held no sample at all (only padding, period or reserved
    /// codes, or samples that could not be reconstructed).
    #[error("frame contains no samples")]
    NoSamples,

    /// Unreceived runs let a few bytes expand into many samples; the
    /// limit bounds the output of a single frame.
    #[error("frame expands to more than {limit} samples")]
    TooManySamples { limit: usize },

    #[error("frame at offset {offset} is {len} bytes, limit is {limit}")]
    FrameTooLarge {
        offset: usize,
        len: u64,
        limit: usize,
    },

    /// The capsule ended without the zero-length end-of-frames marker.
    #[error("capsule does not end with an end-of-frames marker")]
    MissingEndMarker,

    #[error("trailer announces {expected} samples, decoded {actual}")]
    SampleCountMismatch { expected: u64, actual: u64 },

    /// The decompressed records do not hash to the trailer checksum.
    #[error("checksum mismatch: records do not match the capsule digest")]
    ChecksumMismatch {
        expected: [u8; 32],
        actual: [u8; 32],
    },

    #[error("unexpected data after capsule end ({extra_bytes} bytes)")]
    TrailingData { extra_bytes: usize },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
