//! Log records: what the operator sees in the mission log.

use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use super::EventKind;

/// A single line in the mission log. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub kind: EventKind,
    pub content: String,
    pub timestamp: Timestamp,
}

impl LogRecord {
    /// The timestamp as local wall-clock time, `HH:MM:SS`.
    pub fn local_time(&self) -> String {
        self.timestamp
            .to_zoned(TimeZone::system())
            .strftime("%H:%M:%S")
            .to_string()
    }
}
