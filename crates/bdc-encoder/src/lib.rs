#![warn(clippy::pedantic)]

pub mod encoder;
pub mod error;
pub mod frame;

pub use encoder::CapsuleEncoder;
pub use error::EncodeError;
pub use frame::FrameEncoder;
