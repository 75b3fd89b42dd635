#![warn(clippy::pedantic)]

pub mod bit_stream;
pub mod error;
pub mod header;
pub mod trailer;
pub mod varint;

pub use bit_stream::{BitReader, BitWriter};
pub use error::WireError;
pub use header::{CapsuleFlags, CapsuleHeader};
pub use trailer::Trailer;
