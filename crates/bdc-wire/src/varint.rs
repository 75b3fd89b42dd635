use crate::error::WireError;

/// Maximum number of bytes a u64 varint can occupy.
/// ceil(64 / 7) = 10 bytes.
pub const MAX_VARINT_BYTES: usize = 10;

/// Append `value` to `out` as an unsigned LEB128 varint.
///
/// Capsule files use varints for frame lengths and the trailer sample
/// count, which are small in practice: a 244-byte radio frame length
/// takes 2 bytes, the end-of-frames marker takes 1.
///
/// Returns the number of bytes appended (1–10).
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out.len() - start
}

/// Decode an unsigned LEB128 varint from the front of `buf`.
///
/// # Returns
///
/// `(decoded_value, bytes_consumed)` on success.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] if 10 bytes are read without a
///   terminating byte.
/// - [`WireError::UnexpectedEof`] if the slice ends mid-varint.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_BYTES {
            return Err(WireError::VarintTooLong);
        }

        result |= u64::from(byte & 0x7F) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(WireError::UnexpectedEof { offset: buf.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let n = encode_varint(value, &mut out);
        assert_eq!(n, out.len());
        out
    }

    #[test]
    fn end_marker_is_single_zero_byte() {
        assert_eq!(encode(0), vec![0x00]);
    }

    #[test]
    fn radio_frame_length_takes_two_bytes() {
        assert_eq!(encode(244), vec![0xF4, 0x01]);
    }

    #[test]
    fn max_frame_length() {
        // 8191 = 0b11_1111_1111_111
        assert_eq!(encode(8191), vec![0xFF, 0x3F]);
    }

    #[test]
    fn appends_after_existing_bytes() {
        let mut out = vec![0xAA];
        encode_varint(300, &mut out);
        assert_eq!(out, vec![0xAA, 0xAC, 0x02]);
    }

    #[test]
    fn u64_max_uses_ten_bytes() {
        assert_eq!(encode(u64::MAX).len(), MAX_VARINT_BYTES);
    }

    #[test]
    fn decodes_sample_counts() {
        for value in [1u64, 127, 128, 200_000, u64::from(u32::MAX), u64::MAX] {
            let bytes = encode(value);
            assert_eq!(decode_varint(&bytes).unwrap(), (value, bytes.len()));
        }
    }

    #[test]
    fn decode_leaves_trailing_bytes() {
        let (value, consumed) = decode_varint(&[0xF4, 0x01, 0x42]).unwrap();
        assert_eq!(value, 244);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn decode_empty_input() {
        assert!(matches!(
            decode_varint(&[]),
            Err(WireError::UnexpectedEof { offset: 0 })
        ));
    }

    #[test]
    fn decode_truncated() {
        assert!(matches!(
            decode_varint(&[0x80, 0x80]),
            Err(WireError::UnexpectedEof { offset: 2 })
        ));
    }

    #[test]
    fn decode_too_long() {
        assert!(matches!(
            decode_varint(&[0xFF; 11]),
            Err(WireError::VarintTooLong)
        ));
    }
}
