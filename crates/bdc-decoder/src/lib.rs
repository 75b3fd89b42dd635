#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod detect;
pub mod error;
pub mod frame;
pub mod streaming;

pub use config::DecoderConfig;
pub use decoder::{CapsuleDecoder, DecodedCapsule, FrameSummary, uncompress, uncompress_with_config};
pub use detect::{Format, detect_format};
pub use error::DecodeError;
pub use frame::FrameDecoder;
pub use streaming::{DecoderEvent, StreamingDecoder};
