//! # Channel Groups
//!
//! The fixed set of IMU channel groups the store holds, and the descriptors
//! the correlator is driven with.
//!
//! | Group | Metric | Instances | Raw width |
//! |-------|--------|-----------|-----------|
//! | Quaternion | `quaternions` | q1 q2 q3 q4 | - |
//! | Gyroscope | `position` | X Y Z | 16 bit |
//! | Accelerometer | `acceleration` | X Y Z | 16 bit |

use std::fmt;

use super::correlator::{correlate, CorrelatedSample};
use super::record::ChannelRecord;

/// Measurement all IMU metrics are stored under
pub const QUERY_MEASUREMENT: &str = "HKB";

/// Default correlation tolerance in seconds
pub const DEFAULT_TOLERANCE_S: f64 = 1.0;

const QUATERNION_INSTANCES: &[&str] = &["q1", "q2", "q3", "q4"];
const AXIS_INSTANCES: &[&str] = &["X", "Y", "Z"];

/// IMU channel group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelGroup {
    /// On-board attitude quaternion
    Quaternion,
    /// Raw gyroscope registers
    Gyroscope,
    /// Raw accelerometer registers
    Accelerometer,
}

impl ChannelGroup {
    /// Every group, in update order
    pub const ALL: [ChannelGroup; 3] = [
        ChannelGroup::Quaternion,
        ChannelGroup::Accelerometer,
        ChannelGroup::Gyroscope,
    ];

    /// Metric tag the group is stored under
    pub fn metric(&self) -> &'static str {
        match self {
            ChannelGroup::Quaternion => "quaternions",
            ChannelGroup::Gyroscope => "position",
            ChannelGroup::Accelerometer => "acceleration",
        }
    }

    /// Cyclic instance order
    pub fn instances(&self) -> &'static [&'static str] {
        match self {
            ChannelGroup::Quaternion => QUATERNION_INSTANCES,
            ChannelGroup::Gyroscope | ChannelGroup::Accelerometer => AXIS_INSTANCES,
        }
    }

    /// Register width for two's-complement decoding, `None` for already-signed data
    pub fn signed_bit_width(&self) -> Option<u8> {
        match self {
            ChannelGroup::Quaternion => None,
            ChannelGroup::Gyroscope | ChannelGroup::Accelerometer => Some(16),
        }
    }

    /// InfluxQL selecting the group's rows of the last `interval_s` seconds
    ///
    /// # Examples
    ///
    /// ```
    /// use gps_imu_monitor::imu::channel::ChannelGroup;
    ///
    /// assert_eq!(
    ///     ChannelGroup::Accelerometer.query(2),
    ///     r#"SELECT "instance", "value" FROM "HKB" WHERE ("metric" = 'acceleration' AND time > now()-2s)"#
    /// );
    /// ```
    pub fn query(&self, interval_s: u64) -> String {
        format!(
            r#"SELECT "instance", "value" FROM "{}" WHERE ("metric" = '{}' AND time > now()-{}s)"#,
            QUERY_MEASUREMENT,
            self.metric(),
            interval_s
        )
    }

    /// Descriptor with the given correlation tolerance
    pub fn descriptor(&self, tolerance_seconds: f64) -> ChannelDescriptor {
        ChannelDescriptor {
            group: *self,
            instance_order: self.instances(),
            tolerance_seconds,
            signed_bit_width: self.signed_bit_width(),
        }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelGroup::Quaternion => "quat",
            ChannelGroup::Gyroscope => "gyro",
            ChannelGroup::Accelerometer => "accel",
        };
        f.write_str(name)
    }
}

/// Everything the correlator needs to resolve one group
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDescriptor {
    pub group: ChannelGroup,
    pub instance_order: &'static [&'static str],
    pub tolerance_seconds: f64,
    pub signed_bit_width: Option<u8>,
}

impl ChannelDescriptor {
    /// Correlate the group's rows and decode raw values
    ///
    /// # Returns
    ///
    /// * `Option<CorrelatedSample>` - A complete decoded sample, or `None`
    ///   when the rows hold no complete cycle or a value is not a register magnitude
    pub fn resolve(&self, records: &[ChannelRecord]) -> Option<CorrelatedSample> {
        correlate(records, self.instance_order, self.tolerance_seconds)?
            .normalized(self.signed_bit_width)
    }
}
