//! # Sample Correlator
//!
//! Rebuilds complete multi-channel samples from single-channel records.
//!
//! The store returns one row per channel instance, in time order, possibly
//! interleaved with rows of other instances and possibly cut off mid-cycle.
//! [`correlate`] walks the rows once with a cursor over the group's declared
//! instance order:
//!
//! - a row is accepted only if it is the instance the cursor expects;
//!   any other row is skipped without losing progress
//! - accepting the group's last instance closes the cycle
//! - a closed cycle whose last row lies within the tolerance of the cycle's
//!   first accepted row is returned; a late cycle is dropped and the next
//!   cycle starts from scratch
//!
//! ## Usage
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use gps_imu_monitor::imu::correlator::correlate;
//! use gps_imu_monitor::imu::record::ChannelRecord;
//!
//! let t0 = Utc.with_ymd_and_hms(2021, 3, 4, 18, 2, 33).unwrap();
//! let records = vec![
//!     ChannelRecord::new("X", 1.0, t0),
//!     ChannelRecord::new("Y", 2.0, t0),
//!     ChannelRecord::new("Z", 3.0, t0),
//! ];
//!
//! let sample = correlate(&records, &["X", "Y", "Z"], 1.0).unwrap();
//! assert_eq!(sample.get("Y"), Some(2.0));
//! assert_eq!(sample.time().to_string(), "18:02:33");
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use super::record::{ChannelRecord, Timestamp};
use super::signed::normalize;
use crate::types::TimeOfDay;

/// One complete cycle of a channel group.
///
/// Every instance of the group's order has exactly one value.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedSample {
    values: BTreeMap<String, f64>,
    timestamp: Timestamp,
}

impl CorrelatedSample {
    /// Value of one instance
    pub fn get(&self, instance: &str) -> Option<f64> {
        self.values.get(instance).copied()
    }

    /// All instance values
    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Timestamp of the record that closed the cycle
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Closing timestamp as `HH:MM:SS`
    pub fn time(&self) -> TimeOfDay {
        TimeOfDay::from(&self.timestamp)
    }

    /// Decode every value as a `bits`-wide two's-complement integer.
    ///
    /// Returns `None` if any value is not a register magnitude; a sample is
    /// never exposed partially decoded.
    pub fn normalized(self, bits: Option<u8>) -> Option<Self> {
        if bits.is_none() {
            return Some(self);
        }

        let values = self
            .values
            .into_iter()
            .map(|(instance, value)| normalize(value, bits).map(|v| (instance, v)))
            .collect::<Option<BTreeMap<_, _>>>()?;

        Some(Self {
            values,
            timestamp: self.timestamp,
        })
    }
}

/// Find the first complete, in-tolerance cycle in `records`
///
/// # Arguments
///
/// * `records` - Rows in the order the store returned them
/// * `instance_order` - The group's cyclic instance order, e.g. `["X", "Y", "Z"]`
/// * `tolerance_seconds` - Largest allowed gap between the first and last row of a cycle
///
/// # Returns
///
/// * `Option<CorrelatedSample>` - The cycle, or `None` if the rows hold no
///   complete cycle. Callers keep their previous sample on `None`.
pub fn correlate(
    records: &[ChannelRecord],
    instance_order: &[&str],
    tolerance_seconds: f64,
) -> Option<CorrelatedSample> {
    let last = instance_order.len().checked_sub(1)?;

    let mut cursor = 0;
    let mut values = BTreeMap::new();
    let mut started_at: Option<Timestamp> = None;

    for record in records {
        if record.instance != instance_order[cursor] {
            continue;
        }

        let start = *started_at.get_or_insert(record.timestamp);
        values.insert(record.instance.clone(), record.value);

        let closes_cycle = cursor == last;
        cursor = (cursor + 1) % instance_order.len();
        if !closes_cycle {
            continue;
        }

        let elapsed = seconds_between(start, record.timestamp);
        if elapsed <= tolerance_seconds {
            return Some(CorrelatedSample {
                values,
                timestamp: record.timestamp,
            });
        }

        debug!(
            "Dropping {}-channel cycle spanning {:.3}s (tolerance {:.3}s)",
            instance_order.len(),
            elapsed,
            tolerance_seconds
        );
        values.clear();
        started_at = None;
    }

    None
}

fn seconds_between(start: Timestamp, end: Timestamp) -> f64 {
    end.signed_duration_since(start)
        .num_nanoseconds()
        .map_or(f64::INFINITY, |ns| (ns as f64 / 1e9).abs())
}

#[cfg(test)]
pub(crate) fn sample_from(pairs: &[(&str, f64)], timestamp: Timestamp) -> CorrelatedSample {
    CorrelatedSample {
        values: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        timestamp,
    }
}
