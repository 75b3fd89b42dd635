use crate::error::WireError;
use crate::varint::{decode_varint, encode_varint};

/// Size of the BLAKE3 checksum carried in the trailer.
pub const CHECKSUM_SIZE: usize = 32;

/// Checksum trailer, present when the header has `HAS_CHECKSUM`.
///
/// ```text
/// ┌──────────────┬───────────────────────────────────────────┐
/// │ varint       │ number of decompressed records            │
/// │ 32 bytes     │ BLAKE3 digest of the records' 6-byte form │
/// └──────────────┴───────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trailer {
    pub sample_count: u64,
    pub checksum: [u8; CHECKSUM_SIZE],
}

impl Trailer {
    /// Append the trailer to `out`, returning the bytes written.
    pub fn write_to(&self, out: &mut Vec<u8>) -> usize {
        let n = encode_varint(self.sample_count, out);
        out.extend_from_slice(&self.checksum);
        n + CHECKSUM_SIZE
    }

    /// Parse a trailer from the front of `buf`.
    ///
    /// # Returns
    ///
    /// `(trailer, bytes_consumed)` on success.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the count or the checksum is
    /// truncated, [`WireError::VarintTooLong`] for a malformed count.
    pub fn read_from(buf: &[u8]) -> Result<(Self, usize), WireError> {
        let (sample_count, n) = decode_varint(buf)?;
        let checksum = buf
            .get(n..n + CHECKSUM_SIZE)
            .and_then(|bytes| <[u8; CHECKSUM_SIZE]>::try_from(bytes).ok())
            .ok_or(WireError::UnexpectedEof { offset: buf.len() })?;

        Ok((
            Self {
                sample_count,
                checksum,
            },
            n + CHECKSUM_SIZE,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_count_then_checksum() {
        let trailer = Trailer {
            sample_count: 300,
            checksum: [0xAB; CHECKSUM_SIZE],
        };
        let mut out = Vec::new();
        assert_eq!(trailer.write_to(&mut out), 34);
        assert_eq!(&out[..2], &[0xAC, 0x02]);
        assert!(out[2..].iter().all(|&b| b == 0xAB));

        let (parsed, consumed) = Trailer::read_from(&out).unwrap();
        assert_eq!(parsed, trailer);
        assert_eq!(consumed, out.len());
    }

    #[test]
    fn truncated_checksum() {
        let mut buf = vec![0x05];
        buf.extend_from_slice(&[0u8; 31]);
        assert!(matches!(
            Trailer::read_from(&buf),
            Err(WireError::UnexpectedEof { offset: 32 })
        ));
    }

    #[test]
    fn missing_count() {
        assert!(matches!(
            Trailer::read_from(&[]),
            Err(WireError::UnexpectedEof { offset: 0 })
        ));
    }
}
