use bdc_wire::WireError;

/// Errors that can occur while compressing records.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── EmptyPayload            ← no records were added before .encode()
///   ├── TemperatureOutOfRange   ← temperature not representable on the wire
///   ├── FrameCapacity           ← frame size outside the supported range
///   ├── Wire(WireError)         ← from bdc-wire serialization
///   └── Io(std::io::Error)      ← from underlying I/O writes
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("no records have been added to the encoder")]
    EmptyPayload,

    /// Only `0..=8190` and the sensor error marker can be encoded.
    #[error("temperature {temperature} cannot be encoded (expected 0..=8190 or 0x7FFF)")]
    TemperatureOutOfRange { temperature: i16 },

    #[error("frame capacity {capacity} bytes is outside {min}..={max}")]
    FrameCapacity {
        capacity: usize,
        min: usize,
        max: usize,
    },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
