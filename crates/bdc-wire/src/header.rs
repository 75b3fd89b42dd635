use crate::error::WireError;

/// Magic number: ASCII "BDC\0".
/// Kept as raw bytes so byte order never comes into play.
pub const CAPSULE_MAGIC: [u8; 4] = [0x42, 0x44, 0x43, 0x00];

/// Total header size in bytes (fixed).
pub const HEADER_SIZE: usize = 8;

/// Current container version major.
pub const VERSION_MAJOR: u8 = 1;

/// Current container version minor.
pub const VERSION_MINOR: u8 = 0;

/// Largest frame the container accepts, in bytes.
///
/// The sensor firmware indexes frame bits with a 16-bit counter, so no
/// frame it produces can be longer than 8191 bytes.
pub const MAX_FRAME_LEN: usize = 8191;

/// Capsule header flags bitfield.
///
/// Bit layout:
///   bit 0 = has checksum (sample count + BLAKE3 digest trailer)
///   bits 1-7 = reserved (MUST be 0)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapsuleFlags(u8);

impl CapsuleFlags {
    /// A checksum trailer follows the end-of-frames marker.
    pub const HAS_CHECKSUM: Self = Self(0b0000_0001);

    pub const NONE: Self = Self(0);

    const KNOWN: u8 = Self::HAS_CHECKSUM.0;

    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn has_checksum(self) -> bool {
        self.0 & Self::HAS_CHECKSUM.0 != 0
    }
}

/// Capsule header: the first 8 bytes of every container file.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ Magic: "BDC\0" (0x42444300)      │
/// │ 0x04   │ 1 byte  │ Version major                    │
/// │ 0x05   │ 1 byte  │ Version minor                    │
/// │ 0x06   │ 1 byte  │ Flags                            │
/// │ 0x07   │ 1 byte  │ Reserved (0x00)                  │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapsuleHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub flags: CapsuleFlags,
}

impl CapsuleHeader {
    /// Create a header with the current version and the given flags.
    pub fn new(flags: CapsuleFlags) -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            flags,
        }
    }

    /// True when `buf` starts with the capsule magic.
    pub fn has_magic(buf: &[u8]) -> bool {
        buf.starts_with(&CAPSULE_MAGIC)
    }

    /// Write the 8-byte header into the provided buffer.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is shorter than
    /// [`HEADER_SIZE`].
    pub fn write_to(&self, buf: &mut [u8]) -> Result<(), WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }

        buf[0..4].copy_from_slice(&CAPSULE_MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.flags.raw();
        buf[7] = 0x00;

        Ok(())
    }

    /// Parse a header from the first 8 bytes of the provided buffer.
    ///
    /// Checks run magic first, then version, flags and reserved byte, so
    /// a file of the wrong kind is reported as such rather than as a
    /// version problem.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if the buffer is too short.
    /// - [`WireError::InvalidMagic`] if the magic number doesn't match.
    /// - [`WireError::UnsupportedVersion`] if the major version is unknown.
    /// - [`WireError::ReservedFlags`] if an undefined flag bit is set.
    /// - [`WireError::ReservedNonZero`] if the reserved byte is not 0x00.
    pub fn read_from(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }

        if buf[0..4] != CAPSULE_MAGIC {
            let found = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
            return Err(WireError::InvalidMagic { found });
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major != VERSION_MAJOR {
            return Err(WireError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let flags = CapsuleFlags::from_raw(buf[6]);
        if flags.raw() & !CapsuleFlags::KNOWN != 0 {
            return Err(WireError::ReservedFlags { flags: flags.raw() });
        }

        if buf[7] != 0x00 {
            return Err(WireError::ReservedNonZero {
                offset: 7,
                value: buf[7],
            });
        }

        Ok(Self {
            version_major,
            version_minor,
            flags,
        })
    }
}
