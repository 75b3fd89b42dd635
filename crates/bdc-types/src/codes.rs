//! Code tables for compressed timestamp/temperature frames.
//!
//! A frame alternates between a timestamp section and a temperature
//! section. Each section is a short chain of decoding steps: a step reads
//! a fixed number of bits, and if they are all ones (the step's escape
//! value) the bits are consumed and the next, wider step is tried.
//!
//! ```text
//!  timestamp                              temperature
//!  ┌────────────┐ 1  ┌─────────────┐ 111  ┌────────────┐ 111  ┌──────────────┐ 1111  ┌───────────────┐
//!  │TimeStart 1b├───▶│TimeControl 3├─────▶│TimeWide 8b │      │TempShort 3b  ├──────▶│TempWide 4b    ├──────▶ TempDirect 13b
//!  └────────────┘    └─────────────┘      └────────────┘      └──────────────┘       └───────────────┘
//! ```
//!
//! Both the encoder and the decoder read their constants from here.

/// A code fragment as written on the wire: the low `nb_bits` of `value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitCode {
  pub value: u32,
  pub nb_bits: u8,
}

impl BitCode {
  #[must_use]
  pub const fn new(value: u32, nb_bits: u8) -> Self {
    Self { value, nb_bits }
  }
}

// ── Timestamp codes ─────────────────────────────────────────────────────

/// `0`: same time as predicted.
pub const CT_DELTA_ZERO: BitCode = BitCode::new(0b0, 1);
/// `1000`: predicted time minus one.
pub const CT_MINUS_ONE: BitCode = BitCode::new(0b1000, 4);
/// `1001`: predicted time plus one.
pub const CT_PLUS_ONE: BitCode = BitCode::new(0b1001, 4);
/// `1010` followed by a raw 32-bit timestamp.
pub const CT_DIRECT: BitCode = BitCode::new(0b1010, 4);
/// `1011`: the sample has no usable timestamp.
pub const CT_INVALID: BitCode = BitCode::new(0b1011, 4);
/// `1100` followed by a 6-bit count of unreceived samples.
pub const CT_UNRECEIVED: BitCode = BitCode::new(0b1100, 4);
/// `1101` followed by a 16-bit sampling period.
pub const CT_NEW_PERIOD: BitCode = BitCode::new(0b1101, 4);
/// `1110`: reserved, never produced by the sensor.
pub const CT_RESERVED: BitCode = BitCode::new(0b1110, 4);
/// `1111` followed by an 8-bit index into the wide delta range.
pub const CT_WIDE_DELTA: BitCode = BitCode::new(0b1111, 4);

pub const CT_DIRECT_NB_BITS: u8 = 32;
pub const CT_UNRECEIVED_NB_BITS: u8 = 6;
pub const CT_NEW_PERIOD_NB_BITS: u8 = 16;
pub const CT_WIDE_NB_BITS: u8 = 8;

/// Largest run a single unreceived code can carry.
pub const CT_UNRECEIVED_MAX: u8 = (1 << CT_UNRECEIVED_NB_BITS) - 1;

/// Period value meaning "no period".
pub const PERIOD_NONE: u16 = u16::MAX;

pub const CT_WIDE_MIN: i32 = -129;
pub const CT_WIDE_MAX: i32 = 129;

/// The control codes reachable from the 3-bit timestamp step, keyed by the
/// low three bits of their 4-bit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeControl {
  MinusOne,
  PlusOne,
  Direct,
  Invalid,
  Unreceived,
  NewPeriod,
  Reserved,
}

impl TimeControl {
  /// Map the 3 bits read after the leading `1`. Returns `None` for the
  /// escape value `111`, which is not a control code.
  #[must_use]
  pub fn from_bits(bits: u32) -> Option<Self> {
    const MASK: u32 = 0b111;
    match bits {
      b if b == CT_MINUS_ONE.value & MASK => Some(Self::MinusOne),
      b if b == CT_PLUS_ONE.value & MASK => Some(Self::PlusOne),
      b if b == CT_DIRECT.value & MASK => Some(Self::Direct),
      b if b == CT_INVALID.value & MASK => Some(Self::Invalid),
      b if b == CT_UNRECEIVED.value & MASK => Some(Self::Unreceived),
      b if b == CT_NEW_PERIOD.value & MASK => Some(Self::NewPeriod),
      b if b == CT_RESERVED.value & MASK => Some(Self::Reserved),
      _ => None,
    }
  }

  /// Number of parameter bits following the code.
  #[must_use]
  pub fn param_bits(self) -> u8 {
    match self {
      Self::Direct => CT_DIRECT_NB_BITS,
      Self::Unreceived => CT_UNRECEIVED_NB_BITS,
      Self::NewPeriod => CT_NEW_PERIOD_NB_BITS,
      Self::MinusOne | Self::PlusOne | Self::Invalid | Self::Reserved => 0,
    }
  }
}

/// Delta carried by a wide timestamp index.
///
/// Indices `0..128` map to −129..=−2 and `128..256` to 2..=129; −1, 0 and
/// +1 have their own shorter codes.
#[must_use]
pub fn wide_time_delta(index: u8) -> i32 {
  let i = i32::from(index);
  if i < 128 { i + CT_WIDE_MIN } else { i - 126 }
}

/// Inverse of [`wide_time_delta`].
#[must_use]
pub fn wide_time_index(delta: i32) -> Option<u8> {
  let index = match delta {
    CT_WIDE_MIN..=-2 => delta - CT_WIDE_MIN,
    2..=CT_WIDE_MAX => delta + 126,
    _ => return None,
  };
  u8::try_from(index).ok()
}

// ── Temperature codes ───────────────────────────────────────────────────

pub const C9_SHORT_NB_BITS: u8 = 3;
pub const C9_WIDE_NB_BITS: u8 = 4;
pub const C9_DIRECT_NB_BITS: u8 = 13;

/// Deltas for short codes `000`..`110`; `111` escapes.
pub const C9_SHORT_DELTAS: [i16; 7] = [-3, -2, -1, 0, 1, 2, 3];

/// Deltas for wide codes `0000`..`1110`; `1111` escapes.
pub const C9_WIDE_DELTAS: [i16; 15] = [-10, -9, -8, -7, -6, -5, -4, 4, 5, 6, 7, 8, 9, 10, 11];

/// Direct value reserved for the sensor error marker.
pub const C9_DIRECT_INVALID: u32 = (1 << C9_DIRECT_NB_BITS) - 1;

/// Index of `delta` in the short temperature table.
#[must_use]
pub fn short_temperature_index(delta: i32) -> Option<u32> {
  position(&C9_SHORT_DELTAS, delta)
}

/// Index of `delta` in the wide temperature table.
#[must_use]
pub fn wide_temperature_index(delta: i32) -> Option<u32> {
  position(&C9_WIDE_DELTAS, delta)
}

fn position(table: &[i16], delta: i32) -> Option<u32> {
  table
    .iter()
    .position(|&d| i32::from(d) == delta)
    .and_then(|i| u32::try_from(i).ok())
}

// ── Decoding steps ──────────────────────────────────────────────────────

/// One step of the frame decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
  TimeStart,
  TimeControl,
  TimeWide,
  TemperatureShort,
  TemperatureWide,
  TemperatureDirect,
}

impl Step {
  /// Bits read by this step.
  #[must_use]
  pub fn nb_bits(self) -> u8 {
    match self {
      Self::TimeStart => CT_DELTA_ZERO.nb_bits,
      Self::TimeControl => 3,
      Self::TimeWide => CT_WIDE_NB_BITS,
      Self::TemperatureShort => C9_SHORT_NB_BITS,
      Self::TemperatureWide => C9_WIDE_NB_BITS,
      Self::TemperatureDirect => C9_DIRECT_NB_BITS,
    }
  }

  /// The all-ones value that moves on to the next step, for steps that
  /// have one. The last step of each section uses its full range.
  #[must_use]
  pub fn escape(self) -> Option<(u32, Step)> {
    let all_ones = (1u32 << self.nb_bits()) - 1;
    match self {
      Self::TimeStart => Some((all_ones, Self::TimeControl)),
      Self::TimeControl => Some((all_ones, Self::TimeWide)),
      Self::TemperatureShort => Some((all_ones, Self::TemperatureWide)),
      Self::TemperatureWide => Some((all_ones, Self::TemperatureDirect)),
      Self::TimeWide | Self::TemperatureDirect => None,
    }
  }
}
