use bdc_wire::CapsuleHeader;

/// Shape of an input buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Zero bytes.
    Empty,
    /// Capsule container (starts with the `BDC\0` magic).
    Capsule,
    /// A single bare frame as received from the sensor.
    RawFrame,
}

/// Classify `bytes` by their leading magic.
///
/// Bare frames have no header, so anything that is not a capsule is
/// taken to be one. A frame that happens to start with the four magic
/// bytes is read as a capsule; wrap such frames in a capsule to decode
/// them unambiguously.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> Format {
    if bytes.is_empty() {
        Format::Empty
    } else if CapsuleHeader::has_magic(bytes) {
        Format::Capsule
    } else {
        Format::RawFrame
    }
}
