use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block as observed from the explorer: its height and the timestamp
/// string exactly as the API reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub height: u64,
    pub time: String,
}

impl BlockRecord {
    pub fn new(height: u64, time: impl Into<String>) -> Self {
        Self {
            height,
            time: time.into(),
        }
    }

    /// Parse `time` as an instant in UTC.
    ///
    /// Accepts RFC 3339 (`2024-04-20T00:09:27Z`, with or without fractional
    /// seconds or an offset) and offset-less ISO-8601 strings, which are read
    /// as UTC. Returns `None` for anything else.
    pub fn parsed_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.time.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}
