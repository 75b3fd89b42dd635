use bdc_wire::trailer::CHECKSUM_SIZE;

use crate::record::Record;

/// Size of the capsule checksum in bytes.
pub const DIGEST_SIZE: usize = CHECKSUM_SIZE;

/// Incremental BLAKE3 digest over decompressed records.
///
/// Each record contributes its canonical 6-byte form
/// ([`Record::to_le_bytes`]), so the digest depends only on the sample
/// values, never on how they were compressed or split into frames.
#[derive(Clone, Debug, Default)]
pub struct RecordDigest {
  hasher: blake3::Hasher,
  count: u64,
}

impl RecordDigest {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn update(&mut self, record: &Record) {
    self.hasher.update(&record.to_le_bytes());
    self.count += 1;
  }

  pub fn update_all<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) {
    for record in records {
      self.update(record);
    }
  }

  /// Records hashed so far.
  #[must_use]
  pub fn count(&self) -> u64 {
    self.count
  }

  /// Current digest and record count. The digest can keep being updated
  /// afterwards.
  #[must_use]
  pub fn finalize(&self) -> ([u8; DIGEST_SIZE], u64) {
    (*self.hasher.finalize().as_bytes(), self.count)
  }

  /// One-shot digest of a record slice.
  #[must_use]
  pub fn of(records: &[Record]) -> [u8; DIGEST_SIZE] {
    let mut digest = Self::new();
    digest.update_all(records);
    digest.finalize().0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_digest_is_blake3_of_nothing() {
    let (hash, count) = RecordDigest::new().finalize();
    assert_eq!(hash, *blake3::hash(b"").as_bytes());
    assert_eq!(count, 0);
  }

  #[test]
  fn incremental_matches_one_shot() {
    let records = [Record::new(1, 3700), Record::unreceived(), Record::new(61, 3702)];
    let mut digest = RecordDigest::new();
    for r in &records {
      digest.update(r);
    }
    assert_eq!(digest.finalize(), (RecordDigest::of(&records), 3));
  }

  #[test]
  fn digest_covers_canonical_bytes() {
    let records = [Record::new(0x0102_0304, 0x0A0B)];
    let expected = blake3::hash(&[0x04, 0x03, 0x02, 0x01, 0x0B, 0x0A]);
    assert_eq!(RecordDigest::of(&records), *expected.as_bytes());
  }

  #[test]
  fn order_matters() {
    let a = [Record::new(1, 10), Record::new(2, 20)];
    let b = [Record::new(2, 20), Record::new(1, 10)];
    assert_ne!(RecordDigest::of(&a), RecordDigest::of(&b));
  }
}
