//! # Conversion Protocol
//!
//! Line format spoken with the attitude conversion service.
//!
//! - greeting (service → client, on connect): `Imu conv`
//! - request (client → service): `<gx>,<gy>,<gz>,<ax>,<ay>,<az>\n`
//! - reply (service → client): free text containing
//!   `Q<q1>,<q2>,<q3>,<q4>E<roll>,<pitch>,<yaw>`

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::ConvertError;
use crate::imu::CorrelatedSample;
use crate::types::NumericToken;

/// Exact greeting the service sends on connect
pub const GREETING: &[u8] = b"Imu conv";

/// Axis order of each request triple
pub const REQUEST_AXES: [&str; 3] = ["X", "Y", "Z"];

/// Decimal token as emitted by the service (exponent allowed)
pub const REPLY_NUMERIC: &str = r"[-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)*";

/// `Q<q1>,<q2>,<q3>,<q4>E<roll>,<pitch>,<yaw>`
///
/// Groups 1..=4 are the quaternion, 5..=7 the Euler angles.
static REPLY: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        "Q({c})?,({c})?,({c})?,({c})?E({c})?,({c})?,({c})?",
        c = REPLY_NUMERIC
    );
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid reply pattern {pattern:?}: {e}"))
});

/// Roll/pitch/yaw in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: NumericToken,
    pub pitch: NumericToken,
    pub yaw: NumericToken,
}

/// Attitude returned by the service
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConvertedAttitude {
    /// `q1..q4`
    pub quaternion: [NumericToken; 4],

    pub euler: EulerAngles,
}

impl fmt::Display for ConvertedAttitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [q1, q2, q3, q4] = self.quaternion;
        write!(
            f,
            "CONV_QUAT = ({},{},{},{}) EULERS = ({},{},{})",
            q1, q2, q3, q4, self.euler.roll, self.euler.pitch, self.euler.yaw
        )
    }
}

/// Format one request line, gyroscope first
///
/// A component missing from a sample is sent as an empty field.
pub fn format_request(gyro: &CorrelatedSample, accel: &CorrelatedSample) -> String {
    let fields: Vec<String> = [gyro, accel]
        .iter()
        .flat_map(|sample| {
            REQUEST_AXES
                .iter()
                .map(move |axis| sample.get(axis).map(|v| v.to_string()).unwrap_or_default())
        })
        .collect();

    format!("{}\n", fields.join(","))
}

/// Extract the first quaternion/Euler record from a reply
///
/// # Errors
///
/// Returns [`ConvertError::MalformedReply`] if the reply holds no
/// `Q…E…` record. Empty numeric fields are not errors; they decode to
/// [`NumericToken::Missing`].
///
/// # Examples
///
/// ```
/// use gps_imu_monitor::converter::protocol::parse_reply;
/// use gps_imu_monitor::types::NumericToken;
///
/// let attitude = parse_reply("Q1.0,2.0,3.0,4.0E0.1,0.2,0.3")?;
/// assert_eq!(attitude.quaternion[3], NumericToken::Value(4.0));
/// assert_eq!(attitude.euler.yaw, NumericToken::Value(0.3));
/// assert!(parse_reply("Q1.0,2.0,3.0,4.0").is_err());
/// # Ok::<(), gps_imu_monitor::error::ConvertError>(())
/// ```
pub fn parse_reply(reply: &str) -> Result<ConvertedAttitude, ConvertError> {
    let caps = REPLY
        .captures(reply)
        .ok_or_else(|| ConvertError::MalformedReply(reply.to_string()))?;

    Ok(ConvertedAttitude {
        quaternion: [field(&caps, 1), field(&caps, 2), field(&caps, 3), field(&caps, 4)],
        euler: EulerAngles {
            roll: field(&caps, 5),
            pitch: field(&caps, 6),
            yaw: field(&caps, 7),
        },
    })
}

fn field(caps: &Captures<'_>, index: usize) -> NumericToken {
    NumericToken::parse(caps.get(index).map(|m| m.as_str()))
}
