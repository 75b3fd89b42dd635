//! JSON form of a record list, shared by `bdc encode` (input) and
//! `bdc decode --format json` (output).
//!
//! ```json
//! {
//!   "period": 30,
//!   "records": [
//!     { "time": 1700000000, "temperature": 3712, "celsius": 37.12 },
//!     { "time": null,       "temperature": 3713 },
//!     { "time": 1700000060, "temperature": null },
//!     { "unreceived": true }
//!   ]
//! }
//! ```
//!
//! A `null` time is an invalid timestamp and a `null` temperature the
//! sensor error marker. `celsius` is informative and ignored on input.

use bdc_types::{Record, TEMPERATURE_INVALID, TIME_INVALID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u16>,
    pub records: Vec<ManifestRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    #[serde(default)]
    pub time: Option<u32>,

    #[serde(default)]
    pub temperature: Option<i16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celsius: Option<f64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unreceived: bool,
}

impl From<&Record> for ManifestRecord {
    fn from(record: &Record) -> Self {
        if record.is_unreceived() {
            return Self {
                time: None,
                temperature: None,
                celsius: None,
                unreceived: true,
            };
        }
        Self {
            time: record.has_valid_time().then_some(record.time),
            temperature: record.has_valid_temperature().then_some(record.temperature),
            celsius: record.celsius(),
            unreceived: false,
        }
    }
}

impl From<&ManifestRecord> for Record {
    fn from(entry: &ManifestRecord) -> Self {
        if entry.unreceived {
            return Record::unreceived();
        }
        Record::new(
            entry.time.unwrap_or(TIME_INVALID),
            entry.temperature.unwrap_or(TEMPERATURE_INVALID),
        )
    }
}
