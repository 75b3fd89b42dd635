use crate::codes::{C9_DIRECT_INVALID, PERIOD_NONE};
use crate::record::{TEMPERATURE_INVALID, TIME_INVALID};

/// Running timestamp state of a frame.
///
/// Deltas are relative to a *prediction*: the last valid time plus one
/// sampling period for every sample since then (the current one
/// included). Invalid and unreceived samples advance the missed counter
/// so the next valid delta lands on the right slot.
///
/// The encoder and decoder each hold one and feed it the same codes, so
/// the prediction the encoder computes is exactly what the decoder will
/// reconstruct. All arithmetic wraps modulo 2³².
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeContext {
  last: Option<u32>,
  period: Option<u16>,
  missed: u32,
}

impl TimeContext {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Time a delta of zero would resolve to, if there is a reference.
  #[must_use]
  pub fn predict(&self) -> Option<u32> {
    self.last.map(|last| match self.period {
      Some(period) => last.wrapping_add(self.missed.wrapping_add(1).wrapping_mul(u32::from(period))),
      None => last,
    })
  }

  /// Resolve a delta code. Returns `None` when there is no reference
  /// timestamp yet; the sample then counts as missed.
  pub fn apply_delta(&mut self, delta: i32) -> Option<u32> {
    let Some(last) = self.last else {
      self.missed = self.missed.wrapping_add(1);
      return None;
    };

    let mut time = last.wrapping_add_signed(delta);
    if let Some(period) = self.period {
      time = time.wrapping_add(self.missed.wrapping_add(1).wrapping_mul(u32::from(period)));
      self.missed = 0;
    }
    self.last = Some(time);
    Some(time)
  }

  /// Resolve a direct timestamp. It becomes the new reference and clears
  /// the missed counter.
  pub fn apply_direct(&mut self, time: u32) -> u32 {
    self.last = Some(time);
    self.missed = 0;
    time
  }

  /// Account for one sample without a timestamp.
  pub fn mark_invalid(&mut self) -> u32 {
    self.missed = self.missed.wrapping_add(1);
    TIME_INVALID
  }

  /// Account for a run of `count` unreceived samples.
  pub fn mark_unreceived(&mut self, count: u32) {
    self.missed = self.missed.wrapping_add(count);
  }

  /// Install a new sampling period; [`PERIOD_NONE`] clears it.
  pub fn set_period(&mut self, period: u16) {
    self.period = (period != PERIOD_NONE).then_some(period);
  }

  #[must_use]
  pub fn period(&self) -> Option<u16> {
    self.period
  }

  #[must_use]
  pub fn last(&self) -> Option<u32> {
    self.last
  }

  #[must_use]
  pub fn missed(&self) -> u32 {
    self.missed
  }
}

/// Running temperature reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemperatureContext {
  last: Option<i16>,
}

impl TemperatureContext {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn last(&self) -> Option<i16> {
    self.last
  }

  /// Resolve a delta code. `None` when there is no reference, in which
  /// case the sample cannot be reconstructed.
  pub fn apply_delta(&mut self, delta: i16) -> Option<i16> {
    let value = self.last?.wrapping_add(delta);
    Some(self.store(i32::from(value)))
  }

  /// Resolve a raw 13-bit direct value.
  pub fn apply_direct(&mut self, raw: u16) -> i16 {
    self.store(i32::from(raw))
  }

  /// The error marker never becomes the reference, whichever code
  /// produced it.
  fn store(&mut self, value: i32) -> i16 {
    if u32::try_from(value).ok() == Some(C9_DIRECT_INVALID) {
      return TEMPERATURE_INVALID;
    }
    let Ok(value) = i16::try_from(value) else {
      // only reachable with a raw value wider than 13 bits
      return TEMPERATURE_INVALID;
    };
    self.last = Some(value);
    value
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn delta_without_reference_is_missed() {
    let mut ctx = TimeContext::new();
    assert_eq!(ctx.apply_delta(0), None);
    assert_eq!(ctx.missed(), 1);
    assert_eq!(ctx.predict(), None);
  }

  #[test]
  fn delta_without_period_is_plain_offset() {
    let mut ctx = TimeContext::new();
    ctx.apply_direct(1_000);
    assert_eq!(ctx.apply_delta(5), Some(1_005));
    assert_eq!(ctx.apply_delta(-10), Some(995));
  }

  #[test]
  fn delta_with_period_adds_one_period() {
    let mut ctx = TimeContext::new();
    ctx.set_period(60);
    ctx.apply_direct(1_000);
    assert_eq!(ctx.predict(), Some(1_060));
    assert_eq!(ctx.apply_delta(0), Some(1_060));
    assert_eq!(ctx.apply_delta(-1), Some(1_119));
  }

  #[test]
  fn missed_samples_stretch_the_prediction() {
    let mut ctx = TimeContext::new();
    ctx.set_period(30);
    ctx.apply_direct(0);
    assert_eq!(ctx.mark_invalid(), TIME_INVALID);
    ctx.mark_unreceived(3);
    // four missed slots plus the current one
    assert_eq!(ctx.predict(), Some(150));
    assert_eq!(ctx.apply_delta(2), Some(152));
    assert_eq!(ctx.missed(), 0);
  }

  #[test]
  fn direct_clears_missed_counter() {
    let mut ctx = TimeContext::new();
    ctx.set_period(10);
    ctx.apply_direct(100);
    ctx.mark_invalid();
    ctx.apply_direct(500);
    assert_eq!(ctx.missed(), 0);
    assert_eq!(ctx.predict(), Some(510));
  }

  #[test]
  fn period_none_clears_period() {
    let mut ctx = TimeContext::new();
    ctx.set_period(10);
    assert_eq!(ctx.period(), Some(10));
    ctx.set_period(PERIOD_NONE);
    assert_eq!(ctx.period(), None);
  }

  #[test]
  fn arithmetic_wraps() {
    let mut ctx = TimeContext::new();
    ctx.apply_direct(u32::MAX - 1);
    assert_eq!(ctx.apply_delta(3), Some(1));
  }

  #[test]
  fn temperature_delta_needs_reference() {
    let mut ctx = TemperatureContext::new();
    assert_eq!(ctx.apply_delta(1), None);
    assert_eq!(ctx.apply_direct(3700), 3700);
    assert_eq!(ctx.apply_delta(-3), Some(3697));
    assert_eq!(ctx.last(), Some(3697));
  }

  #[test]
  fn invalid_marker_keeps_previous_reference() {
    let mut ctx = TemperatureContext::new();
    ctx.apply_direct(3700);
    assert_eq!(ctx.apply_direct(8191), TEMPERATURE_INVALID);
    assert_eq!(ctx.last(), Some(3700));
  }

  #[test]
  fn delta_landing_on_marker_is_invalid() {
    let mut ctx = TemperatureContext::new();
    ctx.apply_direct(8190);
    assert_eq!(ctx.apply_delta(1), Some(TEMPERATURE_INVALID));
    assert_eq!(ctx.last(), Some(8190));
  }
}
