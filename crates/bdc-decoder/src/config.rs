/// Default per-frame sample limit, the size of the sensor's own
/// decompression buffer.
pub const DEFAULT_MAX_SAMPLES: usize = 200_000;

/// Decoder settings.
///
/// ```text
/// ┌─────────────────┬──────────────────────────────────────────────┐
/// │ Field           │ Purpose                                      │
/// ├─────────────────┼──────────────────────────────────────────────┤
/// │ max_samples     │ Upper bound on samples produced by one frame │
/// │ verify_checksum │ Check the capsule trailer against the output │
/// └─────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub max_samples: usize,

    /// When `false` the trailer is still parsed (so its bytes are not
    /// reported as trailing data) but not compared.
    pub verify_checksum: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
            verify_checksum: true,
        }
    }
}
