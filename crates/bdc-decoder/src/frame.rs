use bdc_types::codes::{C9_SHORT_DELTAS, C9_WIDE_DELTAS, PERIOD_NONE, wide_time_delta};
use bdc_types::{Record, Step, TemperatureContext, TimeContext, TimeControl, TIME_INVALID};
use bdc_wire::BitReader;
use tracing::{debug, trace, warn};

use crate::config::DecoderConfig;
use crate::error::DecodeError;

/// Decompresses bare frames.
///
/// One `FrameDecoder` is one decoding session. The timestamp context is
/// rebuilt for every frame (each frame carries its own period and first
/// direct timestamp), while the temperature reference carries over from
/// frame to frame, so a frame may open with a temperature delta when the
/// previous frame of the same session ended on a valid temperature.
///
/// The decoding loop follows the step chain of [`bdc_types::codes`]:
///
/// ```text
///   1. read the bits of the current step
///   2. all ones and the step has an escape → move to the next step, goto 1
///   3. otherwise resolve the code:
///        timestamp codes    → fix the time of the next sample, or emit
///                             unreceived samples / change the period
///        temperature codes  → emit one sample
///   4. goto 1 until the frame runs out of bits
/// ```
///
/// Running out of bits mid-code is the normal end of a frame: the sender
/// pads the last byte with 1-bits, which never complete a code.
///
/// # Example
///
/// ```rust
/// use bdc_decoder::FrameDecoder;
///
/// // 1010 + 32-bit time 60, then 111 1111 + 13-bit temperature 3700
/// let frame = [0xA0, 0x00, 0x00, 0x03, 0xCF, 0xEE, 0x74];
/// let records = FrameDecoder::new().decode(&frame).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].time, 60);
/// assert_eq!(records[0].temperature, 3700);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrameDecoder {
    config: DecoderConfig,
    temperature: TemperatureContext,
}

/// Collects emitted samples and enforces the per-frame limit.
struct Sink<F> {
    emit: F,
    count: usize,
    limit: usize,
}

impl<F: FnMut(Record)> Sink<F> {
    fn push(&mut self, record: Record) -> Result<(), DecodeError> {
        if self.count >= self.limit {
            return Err(DecodeError::TooManySamples { limit: self.limit });
        }
        trace!(
            sample = self.count + 1,
            time = record.time,
            temperature = record.temperature,
            "sample"
        );
        (self.emit)(record);
        self.count += 1;
        Ok(())
    }
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            temperature: TemperatureContext::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Forget the temperature reference carried between frames.
    pub fn reset(&mut self) {
        self.temperature = TemperatureContext::new();
    }

    /// Decode one frame into a vector of records.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::NoSamples`] if the frame yields no sample.
    /// - [`DecodeError::TooManySamples`] if it yields more than
    ///   [`DecoderConfig::max_samples`].
    pub fn decode(&mut self, frame: &[u8]) -> Result<Vec<Record>, DecodeError> {
        let mut records = Vec::new();
        self.decode_with(frame, |record| records.push(record))?;
        Ok(records)
    }

    /// Decode one frame, handing each record to `emit` as soon as it is
    /// complete. Returns the number of records emitted.
    ///
    /// Records already emitted stay emitted when an error is returned
    /// later in the frame.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode).
    pub fn decode_with<F>(&mut self, frame: &[u8], emit: F) -> Result<usize, DecodeError>
    where
        F: FnMut(Record),
    {
        debug!(bytes = frame.len(), "decoding frame");

        let mut reader = BitReader::new(frame);
        let mut time = TimeContext::new();
        let mut sink = Sink {
            emit,
            count: 0,
            limit: self.config.max_samples,
        };
        let mut step = Step::TimeStart;
        let mut sample_time = TIME_INVALID;

        while let Some(bits) = reader.get_bits(step.nb_bits()) {
            if let Some((escape, next)) = step.escape()
                && bits == escape
            {
                step = next;
                continue;
            }

            step = match step {
                // the only non-escape value of the 1-bit step is delta 0
                Step::TimeStart => {
                    sample_time = resolve_time_delta(&mut time, 0);
                    Step::TemperatureShort
                }
                Step::TimeControl => {
                    let Some(control) = TimeControl::from_bits(bits) else {
                        step = Step::TimeStart;
                        continue;
                    };
                    let param = match control.param_bits() {
                        0 => 0,
                        nb => match reader.get_bits(nb) {
                            Some(value) => value,
                            None => break,
                        },
                    };
                    match control {
                        TimeControl::MinusOne => {
                            sample_time = resolve_time_delta(&mut time, -1);
                            Step::TemperatureShort
                        }
                        TimeControl::PlusOne => {
                            sample_time = resolve_time_delta(&mut time, 1);
                            Step::TemperatureShort
                        }
                        TimeControl::Direct => {
                            trace!(time = param, "direct timestamp");
                            sample_time = time.apply_direct(param);
                            Step::TemperatureShort
                        }
                        TimeControl::Invalid => {
                            trace!("invalid timestamp");
                            sample_time = time.mark_invalid();
                            Step::TemperatureShort
                        }
                        TimeControl::Unreceived => {
                            trace!(count = param, "unreceived samples");
                            for _ in 0..param {
                                sink.push(Record::unreceived())?;
                            }
                            time.mark_unreceived(param);
                            Step::TimeStart
                        }
                        TimeControl::NewPeriod => {
                            trace!(period = param, "new period");
                            time.set_period(u16::try_from(param).unwrap_or(PERIOD_NONE));
                            Step::TimeStart
                        }
                        TimeControl::Reserved => {
                            warn!(bit = reader.position(), "reserved timestamp code ignored");
                            Step::TimeStart
                        }
                    }
                }
                Step::TimeWide => {
                    let Ok(index) = u8::try_from(bits) else { break };
                    sample_time = resolve_time_delta(&mut time, wide_time_delta(index));
                    Step::TemperatureShort
                }
                Step::TemperatureShort => {
                    let value = self.temperature.apply_delta(C9_SHORT_DELTAS[bits as usize]);
                    push_sample(&mut sink, sample_time, value)?;
                    Step::TimeStart
                }
                Step::TemperatureWide => {
                    let value = self.temperature.apply_delta(C9_WIDE_DELTAS[bits as usize]);
                    push_sample(&mut sink, sample_time, value)?;
                    Step::TimeStart
                }
                Step::TemperatureDirect => {
                    let Ok(raw) = u16::try_from(bits) else { break };
                    let value = self.temperature.apply_direct(raw);
                    push_sample(&mut sink, sample_time, Some(value))?;
                    Step::TimeStart
                }
            };
        }

        debug!(samples = sink.count, "frame decoded");
        if sink.count == 0 {
            return Err(DecodeError::NoSamples);
        }
        Ok(sink.count)
    }
}

// The firmware wraps from the sentinel here (u32::MAX + delta becomes the
// reference); this decoder marks the sample invalid instead.
fn resolve_time_delta(time: &mut TimeContext, delta: i32) -> u32 {
    time.apply_delta(delta).unwrap_or_else(|| {
        warn!(delta, "timestamp delta without a reference, marked invalid");
        TIME_INVALID
    })
}

fn push_sample<F: FnMut(Record)>(
    sink: &mut Sink<F>,
    time: u32,
    temperature: Option<i16>,
) -> Result<(), DecodeError> {
    match temperature {
        Some(temperature) => sink.push(Record::new(time, temperature)),
        None => {
            warn!(time, "temperature delta without a reference, sample dropped");
            Ok(())
        }
    }
}
