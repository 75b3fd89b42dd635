/// Timestamp stored for samples whose time is unknown (invalid code or
/// unreceived run).
pub const TIME_INVALID: u32 = u32::MAX;

/// Temperature the sensor reports on an internal error.
pub const TEMPERATURE_INVALID: i16 = 0x7FFF;

/// Temperature stored for samples that were never received
/// (`0xFFFF` reinterpreted as `i16`).
pub const TEMPERATURE_UNRECEIVED: i16 = -1;

/// Largest temperature a direct code can carry. The all-ones 13-bit value
/// (8191) is reserved for [`TEMPERATURE_INVALID`].
pub const MAX_DIRECT_TEMPERATURE: i16 = 8190;

/// One decompressed sample.
///
/// `time` is the sensor timestamp in seconds. `temperature` is in
/// hundredths of a degree Celsius, so `3712` reads 37.12 °C.
///
/// ```text
/// ┌──────────────────────┬─────────────────────────────────────┐
/// │ time                 │ temperature                         │
/// ├──────────────────────┼─────────────────────────────────────┤
/// │ valid                │ 0..=8190, or TEMPERATURE_INVALID    │
/// │ TIME_INVALID         │ 0..=8190, or TEMPERATURE_INVALID    │
/// │ TIME_INVALID         │ TEMPERATURE_UNRECEIVED (unreceived) │
/// └──────────────────────┴─────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Record {
  pub time: u32,
  pub temperature: i16,
}

impl Record {
  #[must_use]
  pub const fn new(time: u32, temperature: i16) -> Self {
    Self { time, temperature }
  }

  /// Placeholder for a sample the receiver never got.
  #[must_use]
  pub const fn unreceived() -> Self {
    Self::new(TIME_INVALID, TEMPERATURE_UNRECEIVED)
  }

  #[must_use]
  pub fn is_unreceived(&self) -> bool {
    self.time == TIME_INVALID && self.temperature == TEMPERATURE_UNRECEIVED
  }

  #[must_use]
  pub fn has_valid_time(&self) -> bool {
    self.time != TIME_INVALID
  }

  #[must_use]
  pub fn has_valid_temperature(&self) -> bool {
    !self.is_unreceived() && self.temperature != TEMPERATURE_INVALID
  }

  /// Temperature in degrees Celsius, if the sample carries one.
  #[must_use]
  pub fn celsius(&self) -> Option<f64> {
    self
      .has_valid_temperature()
      .then(|| f64::from(self.temperature) / 100.0)
  }

  /// Canonical 6-byte form: time (u32 LE) followed by temperature (i16 LE).
  ///
  /// This is the byte sequence the capsule checksum is computed over.
  #[must_use]
  pub fn to_le_bytes(&self) -> [u8; 6] {
    let mut out = [0u8; 6];
    out[..4].copy_from_slice(&self.time.to_le_bytes());
    out[4..].copy_from_slice(&self.temperature.to_le_bytes());
    out
  }
}
