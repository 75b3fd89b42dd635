/// Errors raised while reading or writing the byte-level container
/// structures (varints and the capsule header).
///
/// Bit-level reads never error: running out of bits is the normal way a
/// frame ends, so [`BitReader::get_bits`](crate::BitReader::get_bits)
/// reports it with `None` instead.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Varint encoding exceeded 10 bytes without terminating.
    #[error("varint too long: exceeded 10-byte limit")]
    VarintTooLong,

    /// Input ended before a complete varint or header could be read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Magic number did not match "BDC\0".
    #[error("invalid magic number: expected 0x42444300, got {found:#010X}")]
    InvalidMagic { found: u32 },

    /// Unsupported container version.
    #[error("unsupported version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Reserved byte was non-zero.
    #[error("reserved field at offset {offset} was {value:#04X}, expected 0x00")]
    ReservedNonZero { offset: usize, value: u8 },

    /// A flag bit this version does not define was set.
    #[error("reserved header flag bits set: {flags:#04X}")]
    ReservedFlags { flags: u8 },

    /// I/O error during read or write.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
