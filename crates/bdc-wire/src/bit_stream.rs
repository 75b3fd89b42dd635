//! MSB-first bit streams used by the frame codec.
//!
//! A frame is a run of variable-width codes packed without alignment.
//! Bit 0 of the stream is the most significant bit of byte 0:
//!
//! ```text
//!   byte 0                byte 1
//!   ┌─┬─┬─┬─┬─┬─┬─┬─┐     ┌─┬─┬─┬─┬─┬─┬─┬─┐
//!   │0│1│2│3│4│5│6│7│     │8│9│…│ │ │ │ │ │   ← stream bit index
//!   └─┴─┴─┴─┴─┴─┴─┴─┘     └─┴─┴─┴─┴─┴─┴─┴─┘
//! ```
//!
//! The writer works against a fixed byte capacity (a radio frame), so it
//! keeps two cursors: `current` advances on every write, `confirmed` only
//! when a whole sample has been written and [`BitWriter::commit`] is called.
//! A sample that does not fit can then be dropped with
//! [`BitWriter::rollback`] and carried over to the next frame.

const BITS_PER_BYTE: usize = 8;

/// Fixed-capacity bit writer.
#[derive(Clone, Debug)]
pub struct BitWriter {
    data: Vec<u8>,
    current: usize,
    confirmed: usize,
    capacity_bits: usize,
    samples: usize,
}

impl BitWriter {
    /// Create an empty writer able to hold `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            current: 0,
            confirmed: 0,
            capacity_bits: capacity * BITS_PER_BYTE,
            samples: 0,
        }
    }

    /// Create a writer whose first bit is a pre-committed 1 (start bit).
    ///
    /// Used by links that need a non-zero leading byte to tell an empty
    /// frame from a missing one. A zero-capacity writer has no room for
    /// the start bit and is returned empty.
    #[must_use]
    pub fn with_start_bit(capacity: usize) -> Self {
        let mut writer = Self::new(capacity);
        if capacity > 0 {
            writer.data[0] |= 0x80;
            writer.current = 1;
            writer.confirmed = 1;
        }
        writer
    }

    /// Append the low `nb_bits` bits of `value`, most significant first.
    ///
    /// Returns `false` without touching the stream when `nb_bits` is not
    /// within `1..=32` or the remaining capacity is too small.
    pub fn put_bits(&mut self, value: u32, nb_bits: u8) -> bool {
        let nb = usize::from(nb_bits);
        if nb == 0 || nb > 32 || self.current + nb > self.capacity_bits {
            return false;
        }

        for shift in (0..nb_bits).rev() {
            if (value >> shift) & 1 == 1 {
                self.data[self.current / BITS_PER_BYTE] |= 0x80 >> (self.current % BITS_PER_BYTE);
            }
            self.current += 1;
        }
        true
    }

    /// Confirm every bit written since the last commit and account for
    /// `samples` more samples in the stream.
    pub fn commit(&mut self, samples: usize) {
        self.confirmed = self.current;
        self.samples += samples;
    }

    /// Discard the bits written since the last commit.
    pub fn rollback(&mut self) {
        for idx in self.confirmed..self.current {
            self.data[idx / BITS_PER_BYTE] &= !(0x80 >> (idx % BITS_PER_BYTE));
        }
        self.current = self.confirmed;
    }

    /// Fill the rest of the last confirmed byte with 1-bits.
    ///
    /// Pending (uncommitted) bits are dropped first. A run of fewer than
    /// eight 1-bits can never complete a code, so the decoder stops on it.
    pub fn pad_last_byte(&mut self) {
        self.rollback();
        let used = self.confirmed % BITS_PER_BYTE;
        if used != 0 {
            let fill = BITS_PER_BYTE - used;
            // fill < 8, so the mask fits in a byte
            let mask = ((1u16 << fill) - 1) as u8;
            self.data[self.confirmed / BITS_PER_BYTE] |= mask;
            self.confirmed += fill;
            self.current = self.confirmed;
        }
    }

    /// Confirmed length in bytes, rounded up.
    #[must_use]
    pub fn len(&self) -> usize {
        self.confirmed.div_ceil(BITS_PER_BYTE)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.confirmed == 0
    }

    /// Number of confirmed bits.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.confirmed
    }

    /// Bits still available before the capacity is reached.
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        self.capacity_bits - self.current
    }

    /// Samples accounted for by [`commit`](Self::commit).
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Consume the writer and return the confirmed bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.len();
        self.data.truncate(len);
        self.data
    }
}

/// Bit reader over a borrowed frame.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> BitReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            limit: data.len() * BITS_PER_BYTE,
        }
    }

    /// Read the next `nb_bits` bits as a right-justified value.
    ///
    /// Returns `None` when `nb_bits > 32` or fewer than `nb_bits` bits are
    /// left. In the latter case the remaining bits are still consumed, so
    /// the stream is exhausted afterwards.
    pub fn get_bits(&mut self, nb_bits: u8) -> Option<u32> {
        if nb_bits > 32 {
            return None;
        }

        let mut value: u32 = 0;
        let mut wanted = nb_bits;
        while self.position < self.limit && wanted > 0 {
            let byte = self.data[self.position / BITS_PER_BYTE];
            let bit = (byte >> (7 - self.position % BITS_PER_BYTE)) & 1;
            value = (value << 1) | u32::from(bit);
            self.position += 1;
            wanted -= 1;
        }

        if wanted > 0 { None } else { Some(value) }
    }

    /// Bits consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bits left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_msb_first() {
        let mut w = BitWriter::new(2);
        assert!(w.put_bits(0b101, 3));
        assert!(w.put_bits(0b1_1110, 5));
        assert!(w.put_bits(0xFF, 8));
        w.commit(1);
        assert_eq!(w.into_bytes(), vec![0b1011_1110, 0xFF]);
    }

    #[test]
    fn start_bit_is_pre_committed() {
        let mut w = BitWriter::with_start_bit(1);
        assert_eq!(w.bit_len(), 1);
        assert!(w.put_bits(0, 7));
        w.commit(0);
        assert_eq!(w.into_bytes(), vec![0x80]);
    }

    #[test]
    fn start_bit_on_zero_capacity_is_skipped() {
        let w = BitWriter::with_start_bit(0);
        assert!(w.is_empty());
        assert!(w.into_bytes().is_empty());
    }

    #[test]
    fn refuses_bits_beyond_capacity() {
        let mut w = BitWriter::new(1);
        assert!(w.put_bits(0, 6));
        assert!(!w.put_bits(0b111, 3));
        // the failed write left the stream untouched
        assert_eq!(w.remaining_bits(), 2);
        assert!(w.put_bits(0b11, 2));
        assert_eq!(w.remaining_bits(), 0);
    }

    #[test]
    fn rejects_zero_and_oversized_widths() {
        let mut w = BitWriter::new(8);
        assert!(!w.put_bits(1, 0));
        assert!(!w.put_bits(1, 33));
        assert!(w.put_bits(u32::MAX, 32));
    }

    #[test]
    fn len_counts_only_committed_bits() {
        let mut w = BitWriter::new(4);
        w.put_bits(0b1, 1);
        assert_eq!(w.len(), 0);
        w.commit(1);
        assert_eq!(w.len(), 1);
        assert_eq!(w.samples(), 1);
        w.put_bits(0xFFFF, 16);
        w.commit(2);
        assert_eq!(w.len(), 3);
        assert_eq!(w.samples(), 3);
    }

    #[test]
    fn rollback_clears_pending_bits() {
        let mut w = BitWriter::new(2);
        w.put_bits(0b0, 1);
        w.commit(1);
        w.put_bits(0x7F, 7);
        w.rollback();
        w.put_bits(0, 7);
        w.commit(1);
        assert_eq!(w.into_bytes(), vec![0x00]);
    }

    #[test]
    fn pad_fills_with_ones() {
        let mut w = BitWriter::new(2);
        w.put_bits(0b010, 3);
        w.commit(1);
        w.pad_last_byte();
        assert_eq!(w.bit_len(), 8);
        assert_eq!(w.into_bytes(), vec![0b0101_1111]);
    }

    #[test]
    fn pad_on_byte_boundary_is_noop() {
        let mut w = BitWriter::new(2);
        w.put_bits(0xAB, 8);
        w.commit(1);
        w.pad_last_byte();
        assert_eq!(w.bit_len(), 8);
        assert_eq!(w.into_bytes(), vec![0xAB]);
    }

    #[test]
    fn pad_drops_uncommitted_bits() {
        let mut w = BitWriter::new(2);
        w.put_bits(0b0, 1);
        w.commit(1);
        w.put_bits(0, 10);
        w.pad_last_byte();
        assert_eq!(w.into_bytes(), vec![0b0111_1111]);
    }

    #[test]
    fn reader_returns_right_justified_values() {
        let data = [0b1011_1110, 0xFF];
        let mut r = BitReader::new(&data);
        assert_eq!(r.get_bits(3), Some(0b101));
        assert_eq!(r.get_bits(5), Some(0b1_1110));
        assert_eq!(r.get_bits(8), Some(0xFF));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn reader_reads_full_word() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x80];
        let mut r = BitReader::new(&data);
        assert_eq!(r.get_bits(32), Some(0xDEAD_BEEF));
        assert_eq!(r.get_bits(1), Some(1));
    }

    #[test]
    fn reader_short_read_consumes_rest() {
        let data = [0xFF];
        let mut r = BitReader::new(&data);
        assert_eq!(r.get_bits(4), Some(0xF));
        assert_eq!(r.get_bits(8), None);
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.position(), 8);
    }

    #[test]
    fn reader_rejects_width_over_32() {
        let data = [0u8; 8];
        let mut r = BitReader::new(&data);
        assert_eq!(r.get_bits(33), None);
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn reader_on_empty_input() {
        let mut r = BitReader::new(&[]);
        assert_eq!(r.get_bits(0), Some(0));
        assert_eq!(r.get_bits(1), None);
    }

    #[test]
    fn writer_output_reads_back() {
        let mut w = BitWriter::new(8);
        let fields = [(0b1010u32, 4u8), (1_700_000_000, 32), (0b111_1111, 7), (3650, 13)];
        for (value, bits) in fields {
            assert!(w.put_bits(value, bits));
        }
        w.commit(1);
        w.pad_last_byte();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        for (value, bits) in fields {
            assert_eq!(r.get_bits(bits), Some(value));
        }
    }
}
