use bdc_types::codes::{
    BitCode, C9_DIRECT_INVALID, C9_DIRECT_NB_BITS, C9_SHORT_DELTAS, C9_SHORT_NB_BITS,
    C9_WIDE_DELTAS, C9_WIDE_NB_BITS,
    CT_DELTA_ZERO, CT_DIRECT, CT_DIRECT_NB_BITS, CT_INVALID, CT_MINUS_ONE, CT_NEW_PERIOD,
    CT_NEW_PERIOD_NB_BITS, CT_PLUS_ONE, CT_UNRECEIVED, CT_UNRECEIVED_MAX, CT_UNRECEIVED_NB_BITS,
    CT_WIDE_DELTA, CT_WIDE_NB_BITS, PERIOD_NONE, short_temperature_index, wide_temperature_index,
    wide_time_index,
};
use bdc_types::{
    MAX_DIRECT_TEMPERATURE, Record, TEMPERATURE_INVALID, TemperatureContext, TimeContext,
};
use bdc_wire::BitWriter;
use bdc_wire::header::MAX_FRAME_LEN;
use tracing::trace;

use crate::error::EncodeError;

/// Smallest frame that can always hold one record: a period code, a
/// direct timestamp and a direct temperature (20 + 36 + 20 bits).
pub const MIN_FRAME_CAPACITY: usize = 10;

/// Escape prefix of the direct temperature code (`111` then `1111`).
const C9_DIRECT_PREFIX: BitCode = BitCode::new(0b111_1111, C9_SHORT_NB_BITS + C9_WIDE_NB_BITS);

/// Escape prefix of the wide temperature code.
const C9_WIDE_PREFIX: BitCode = BitCode::new(0b111, C9_SHORT_NB_BITS);

/// Compresses records into one fixed-size frame.
///
/// The encoder mirrors the decoder: it holds the same [`TimeContext`]
/// and [`TemperatureContext`] and, for each record, emits the shortest
/// code that makes the decoder reproduce it.
///
/// ```text
///   timestamp                         temperature
///   delta 0          →  1 bit         delta −3..=3        →  3 bits
///   delta ±1         →  4 bits        delta −10..−4, 4..11 →  7 bits
///   delta ±2..±129   → 12 bits        anything else       → 20 bits
///   anything else    → 36 bits
/// ```
///
/// Every frame stands alone: the period code is written before the
/// first sample and the first timestamp and temperature are direct, so a
/// lost frame never corrupts the next one.
///
/// A record that does not fit in the remaining space is not written at
/// all ([`push`](Self::push) returns `false`), leaving the frame ready to
/// be [`finish`](Self::finish)ed.
#[derive(Clone, Debug)]
pub struct FrameEncoder {
    writer: BitWriter,
    time: TimeContext,
    temperature: TemperatureContext,
    period: Option<u16>,
    period_written: bool,
}

impl FrameEncoder {
    /// Create an encoder for a frame of at most `capacity` bytes, without
    /// a sampling period.
    ///
    /// # Errors
    ///
    /// [`EncodeError::FrameCapacity`] if `capacity` is below
    /// [`MIN_FRAME_CAPACITY`] or above [`MAX_FRAME_LEN`].
    pub fn new(capacity: usize) -> Result<Self, EncodeError> {
        if !(MIN_FRAME_CAPACITY..=MAX_FRAME_LEN).contains(&capacity) {
            return Err(EncodeError::FrameCapacity {
                capacity,
                min: MIN_FRAME_CAPACITY,
                max: MAX_FRAME_LEN,
            });
        }
        Ok(Self {
            writer: BitWriter::new(capacity),
            time: TimeContext::new(),
            temperature: TemperatureContext::new(),
            period: None,
            period_written: false,
        })
    }

    /// Create an encoder whose timestamps are predicted one `period`
    /// apart. [`PERIOD_NONE`] means no period.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_period(capacity: usize, period: u16) -> Result<Self, EncodeError> {
        let mut encoder = Self::new(capacity)?;
        encoder.period = (period != PERIOD_NONE).then_some(period);
        Ok(encoder)
    }

    /// Append one record.
    ///
    /// Unreceived placeholders are written as a run of one; use
    /// [`push_unreceived`](Self::push_unreceived) for longer runs.
    ///
    /// Returns `Ok(false)` when the record does not fit; the frame is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// [`EncodeError::TemperatureOutOfRange`] if the temperature is
    /// neither in `0..=8190` nor the sensor error marker.
    pub fn push(&mut self, record: &Record) -> Result<bool, EncodeError> {
        if record.is_unreceived() {
            return Ok(self.push_unreceived(1) == 1);
        }
        if record.temperature != TEMPERATURE_INVALID
            && !(0..=MAX_DIRECT_TEMPERATURE).contains(&record.temperature)
        {
            return Err(EncodeError::TemperatureOutOfRange {
                temperature: record.temperature,
            });
        }

        let time = self.time.clone();
        let temperature = self.temperature.clone();

        if self.put_period() && self.put_time(record) && self.put_temperature(record.temperature) {
            trace!(
                time = record.time,
                temperature = record.temperature,
                bits = self.writer.bit_len(),
                "record encoded"
            );
            self.writer.commit(1);
            self.period_written = true;
            Ok(true)
        } else {
            self.writer.rollback();
            self.time = time;
            self.temperature = temperature;
            Ok(false)
        }
    }

    /// Append a run of `count` unreceived samples, split into codes of at
    /// most 63. Returns how many were written; fewer than `count` means
    /// the frame is full.
    pub fn push_unreceived(&mut self, count: usize) -> usize {
        let mut written = 0;
        while written < count {
            let chunk = (count - written).min(usize::from(CT_UNRECEIVED_MAX));
            // chunk <= 63
            let chunk_u32 = u32::try_from(chunk).unwrap_or(u32::from(CT_UNRECEIVED_MAX));

            let fits = self.put_period()
                && self.put(CT_UNRECEIVED)
                && self.writer.put_bits(chunk_u32, CT_UNRECEIVED_NB_BITS);
            if !fits {
                self.writer.rollback();
                break;
            }

            trace!(count = chunk, "unreceived run encoded");
            self.writer.commit(chunk);
            self.period_written = true;
            self.time.mark_unreceived(chunk_u32);
            written += chunk;
        }
        written
    }

    /// Samples written so far.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.writer.samples()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writer.samples() == 0
    }

    /// Bytes the frame would take if finished now.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    /// Pad the last byte with 1-bits and return the frame.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.writer.pad_last_byte();
        self.writer.into_bytes()
    }

    fn put(&mut self, code: BitCode) -> bool {
        self.writer.put_bits(code.value, code.nb_bits)
    }

    fn put_period(&mut self) -> bool {
        match self.period {
            Some(period) if !self.period_written => {
                self.time.set_period(period);
                self.put(CT_NEW_PERIOD) && self.writer.put_bits(u32::from(period), CT_NEW_PERIOD_NB_BITS)
            }
            _ => true,
        }
    }

    fn put_time(&mut self, record: &Record) -> bool {
        if !record.has_valid_time() {
            self.time.mark_invalid();
            return self.put(CT_INVALID);
        }

        let Some(predicted) = self.time.predict() else {
            return self.put_direct_time(record.time);
        };
        #[allow(clippy::cast_possible_wrap)]
        let delta = record.time.wrapping_sub(predicted) as i32;

        let fits = match delta {
            0 => self.put(CT_DELTA_ZERO),
            -1 => self.put(CT_MINUS_ONE),
            1 => self.put(CT_PLUS_ONE),
            _ => match wide_time_index(delta) {
                Some(index) => {
                    self.put(CT_WIDE_DELTA) && self.writer.put_bits(u32::from(index), CT_WIDE_NB_BITS)
                }
                None => return self.put_direct_time(record.time),
            },
        };
        self.time.apply_delta(delta);
        fits
    }

    fn put_direct_time(&mut self, time: u32) -> bool {
        self.time.apply_direct(time);
        self.put(CT_DIRECT) && self.writer.put_bits(time, CT_DIRECT_NB_BITS)
    }

    fn put_temperature(&mut self, temperature: i16) -> bool {
        if temperature == TEMPERATURE_INVALID {
            return self.put(C9_DIRECT_PREFIX)
                && self.writer.put_bits(C9_DIRECT_INVALID, C9_DIRECT_NB_BITS);
        }

        if let Some(last) = self.temperature.last() {
            let delta = i32::from(temperature) - i32::from(last);
            if let Some(index) = short_temperature_index(delta) {
                self.temperature.apply_delta(C9_SHORT_DELTAS[index as usize]);
                return self.writer.put_bits(index, C9_SHORT_NB_BITS);
            }
            if let Some(index) = wide_temperature_index(delta) {
                self.temperature.apply_delta(C9_WIDE_DELTAS[index as usize]);
                return self.put(C9_WIDE_PREFIX) && self.writer.put_bits(index, C9_WIDE_NB_BITS);
            }
        }

        // 0..=8190, checked by push
        let raw = temperature.unsigned_abs();
        self.temperature.apply_direct(raw);
        self.put(C9_DIRECT_PREFIX) && self.writer.put_bits(u32::from(raw), C9_DIRECT_NB_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdc_decoder::FrameDecoder;
    use bdc_types::TIME_INVALID;

    fn decode(frame: &[u8]) -> Vec<Record> {
        FrameDecoder::new().decode(frame).unwrap()
    }

    fn encode_all(encoder: &mut FrameEncoder, records: &[Record]) {
        for r in records {
            assert!(encoder.push(r).unwrap(), "record {r:?} did not fit");
        }
    }

    #[test]
    fn first_record_is_direct() {
        let mut enc = FrameEncoder::new(16).unwrap();
        enc.push(&Record::new(60, 3700)).unwrap();
        assert_eq!(enc.finish(), vec![0xA0, 0x00, 0x00, 0x03, 0xCF, 0xEE, 0x74]);
    }

    #[test]
    fn periodic_samples_cost_four_bits() {
        let mut enc = FrameEncoder::with_period(64, 30).unwrap();
        let records: Vec<Record> = (0..10).map(|i| Record::new(1_000 + i * 30, 3650)).collect();
        encode_all(&mut enc, &records);
        // period 20 + first record 56 + nine records of 1 + 3 bits
        assert_eq!(enc.len(), (20 + 56 + 9 * 4 + 7) / 8);
        assert_eq!(decode(&enc.finish()), records);
    }

    #[test]
    fn chooses_each_code_size() {
        let records = [
            Record::new(1_000, 3650),
            Record::new(1_000, 3653),
            Record::new(999, 3643),
            Record::new(1_000, 3654),
            Record::new(1_129, 3600),
            Record::new(500, 3601),
            Record::new(TIME_INVALID, 3602),
            Record::new(502, TEMPERATURE_INVALID),
            Record::new(503, 3590),
        ];
        let mut enc = FrameEncoder::new(128).unwrap();
        encode_all(&mut enc, &records);
        assert_eq!(decode(&enc.finish()), records);
    }

    #[test]
    fn unreceived_runs_split_at_63() {
        let mut enc = FrameEncoder::with_period(64, 10).unwrap();
        enc.push(&Record::new(100, 3700)).unwrap();
        assert_eq!(enc.push_unreceived(70), 70);
        enc.push(&Record::new(100 + 71 * 10, 3700)).unwrap();
        assert_eq!(enc.samples(), 72);

        let records = decode(&enc.finish());
        assert_eq!(records.len(), 72);
        assert!(records[1..71].iter().all(Record::is_unreceived));
        assert_eq!(records[71], Record::new(810, 3700));
    }

    #[test]
    fn unreceived_placeholder_through_push() {
        let mut enc = FrameEncoder::new(16).unwrap();
        assert!(enc.push(&Record::unreceived()).unwrap());
        assert_eq!(decode(&enc.finish()), vec![Record::unreceived()]);
    }

    #[test]
    fn full_frame_rejects_without_side_effects() {
        let mut enc = FrameEncoder::with_period(MIN_FRAME_CAPACITY, 60).unwrap();
        assert!(enc.push(&Record::new(1_000, 3700)).unwrap());
        // a direct timestamp no longer fits
        assert!(!enc.push(&Record::new(9_999_999, 100)).unwrap());
        assert_eq!(enc.samples(), 1);
        // a cheap delta still does
        assert!(enc.push(&Record::new(1_060, 3700)).unwrap());

        let records = decode(&enc.finish());
        assert_eq!(records, vec![Record::new(1_000, 3700), Record::new(1_060, 3700)]);
    }

    #[test]
    fn out_of_range_temperatures() {
        let mut enc = FrameEncoder::new(16).unwrap();
        for temperature in [-5, 8191, i16::MIN] {
            assert!(matches!(
                enc.push(&Record::new(1, temperature)),
                Err(EncodeError::TemperatureOutOfRange { .. })
            ));
        }
        assert!(enc.is_empty());
    }

    #[test]
    fn capacity_bounds() {
        assert!(matches!(
            FrameEncoder::new(MIN_FRAME_CAPACITY - 1),
            Err(EncodeError::FrameCapacity { .. })
        ));
        assert!(FrameEncoder::new(MAX_FRAME_LEN).is_ok());
        assert!(FrameEncoder::new(MAX_FRAME_LEN + 1).is_err());
    }

    #[test]
    fn wrapping_time_delta() {
        let records = [Record::new(u32::MAX - 1, 10), Record::new(3, 10)];
        let mut enc = FrameEncoder::new(16).unwrap();
        encode_all(&mut enc, &records);
        assert_eq!(decode(&enc.finish()), records);
    }
}
