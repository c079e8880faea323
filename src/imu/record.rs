//! # Channel Records
//!
//! Single-channel rows as returned by the time-series store.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

/// Instant a record was stored
pub type Timestamp = DateTime<Utc>;

/// One `(instance, value, timestamp)` row
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    /// Channel label within its group (`X`, `q3`, ...)
    pub instance: String,

    /// Stored value (raw register value for the unsigned channels)
    pub value: f64,

    /// Time the store recorded the value
    pub timestamp: Timestamp,
}

impl ChannelRecord {
    pub fn new(instance: impl Into<String>, value: f64, timestamp: Timestamp) -> Self {
        Self {
            instance: instance.into(),
            value,
            timestamp,
        }
    }
}

/// A row exactly as the store serializes it
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRow {
    pub instance: String,

    /// `null` when the store has no value for the point
    pub value: Option<f64>,

    /// ISO-8601 time with fractional seconds
    pub time: String,
}

impl QueryRow {
    /// Convert into a record, or `None` when the value or time is unusable
    pub fn into_record(self) -> Option<ChannelRecord> {
        let Some(value) = self.value else {
            debug!("Dropping {} row at {} without a value", self.instance, self.time);
            return None;
        };

        let Some(timestamp) = parse_timestamp(&self.time) else {
            debug!("Dropping {} row with unparsable time {:?}", self.instance, self.time);
            return None;
        };

        Some(ChannelRecord {
            instance: self.instance,
            value,
            timestamp,
        })
    }
}

/// Parse a store timestamp
///
/// Accepts RFC 3339 (`2021-03-04T18:02:33.123456789Z`, any precision) and
/// offset-less ISO-8601, which is taken as UTC.
///
/// # Examples
///
/// ```
/// use gps_imu_monitor::imu::record::parse_timestamp;
///
/// let t = parse_timestamp("2021-03-04T18:02:33.123456789Z").unwrap();
/// assert_eq!(t.timestamp_subsec_nanos(), 123_456_789);
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a JSON array of query rows into records
///
/// Rows without a value or with an unparsable time are skipped.
///
/// # Errors
///
/// Returns error if the text is not a JSON array of row objects
pub fn parse_rows(json: &str) -> Result<Vec<ChannelRecord>> {
    let rows: Vec<QueryRow> = serde_json::from_str(json)?;
    Ok(rows.into_iter().filter_map(QueryRow::into_record).collect())
}
