#![warn(clippy::pedantic)]

pub mod codes;
pub mod context;
pub mod digest;
pub mod record;

pub use codes::{BitCode, Step, TimeControl};
pub use context::{TemperatureContext, TimeContext};
pub use digest::{DIGEST_SIZE, RecordDigest};
pub use record::{
  MAX_DIRECT_TEMPERATURE, Record, TEMPERATURE_INVALID, TEMPERATURE_UNRECEIVED, TIME_INVALID,
};
