//! # GPS Sentence Decoder
//!
//! Decodes `gps1`/`gps2` tagged datagrams into orientation and position readings.

use regex::Captures;
use tracing::{debug, trace};

use super::patterns::{FIX_TIME, ORIENTATION, POSITION, SUB_MESSAGE};
use super::types::{GpsSource, Hemisphere, OrientationReading, PositionFix};
use crate::error::DecodeError;
use crate::types::{NumericToken, TimeOfDay};

/// Everything recognized in one datagram.
///
/// When a datagram carries several sub-messages of the same kind, the last
/// one wins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodedDatagram {
    /// Tag of the last sub-message seen
    pub source: Option<GpsSource>,

    /// Last decoded `$PTNL,AVR` reading
    pub orientation: Option<OrientationReading>,

    /// Last decoded `$GPGGA` fix
    pub position: Option<PositionFix>,
}

impl DecodedDatagram {
    /// True when no sub-message produced a reading.
    pub fn is_empty(&self) -> bool {
        self.orientation.is_none() && self.position.is_none()
    }
}

/// Decode a raw datagram payload
///
/// # Arguments
///
/// * `raw` - UDP payload bytes
///
/// # Returns
///
/// * `Result<DecodedDatagram, DecodeError>` - Readings found in the datagram
///
/// # Errors
///
/// Returns [`DecodeError::Encoding`] if the payload is not UTF-8. Unrecognized
/// or malformed sub-messages are skipped, not reported.
///
/// # Examples
///
/// ```
/// use gps_imu_monitor::gps::decoder::decode;
///
/// let raw = b"gps1, $GPGGA,123456.00,4512.34,N,01123.45,E,1,08,0.9,123.4,M";
/// let decoded = decode(raw)?;
/// assert_eq!(decoded.position.unwrap().time.to_string(), "12:34:56");
/// # Ok::<(), gps_imu_monitor::error::DecodeError>(())
/// ```
pub fn decode(raw: &[u8]) -> Result<DecodedDatagram, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|e| DecodeError::Encoding {
        valid_up_to: e.valid_up_to(),
    })?;

    Ok(decode_text(text))
}

/// Decode datagram text that is already known to be valid UTF-8
pub fn decode_text(text: &str) -> DecodedDatagram {
    let mut decoded = DecodedDatagram::default();

    for caps in SUB_MESSAGE.captures_iter(text) {
        let tag = caps.get(1).map_or("", |m| m.as_str());
        let payload = caps.get(2).map_or("", |m| m.as_str());
        trace!("Sub-message from {}: {:?}", tag, payload);

        decoded.source = GpsSource::from_tag(tag).or(decoded.source);

        let orientation = decode_orientation(payload);
        let position = decode_position(payload);

        if orientation.is_none() && position.is_none() {
            debug!("Skipping unrecognized {} sub-message", tag);
            continue;
        }

        if orientation.is_some() {
            decoded.orientation = orientation;
        }
        if position.is_some() {
            decoded.position = position;
        }
    }

    decoded
}

/// Decode the first `$PTNL,AVR` sentence in a payload
///
/// Empty yaw or tilt fields come back as [`NumericToken::Missing`].
pub fn decode_orientation(payload: &str) -> Option<OrientationReading> {
    let caps = ORIENTATION.captures(payload)?;

    Some(OrientationReading {
        yaw: field(&caps, 1),
        tilt: field(&caps, 2),
    })
}

/// Decode the first `$GPGGA` sentence in a payload
///
/// Returns `None` unless time, latitude and longitude (with their hemisphere
/// letters) are all present, so a fix is never half-populated.
pub fn decode_position(payload: &str) -> Option<PositionFix> {
    let caps = POSITION.captures(payload)?;

    let time = parse_fix_time(caps.get(1)?.as_str())?;
    let latitude = packed_degrees(&caps, 2, 3)?;
    let longitude = packed_degrees(&caps, 4, 5)?;

    Some(PositionFix {
        time,
        latitude,
        longitude,
        fix_quality: field(&caps, 6),
        satellites: field(&caps, 7),
        hdop: field(&caps, 8),
        altitude: field(&caps, 9),
    })
}

/// Parse a `HHMMSS.ff` fix time, discarding the fraction
///
/// # Examples
///
/// ```
/// use gps_imu_monitor::gps::decoder::parse_fix_time;
///
/// assert_eq!(parse_fix_time("090807.00").unwrap().to_string(), "09:08:07");
/// assert!(parse_fix_time("9087.00").is_none());
/// ```
pub fn parse_fix_time(token: &str) -> Option<TimeOfDay> {
    let caps = FIX_TIME.captures(token)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u8>().ok());

    TimeOfDay::new(part(1)?, part(2)?, part(3)?)
}

/// Signed decimal value of a packed `DDMM.MMMM` magnitude
pub fn to_decimal_degrees(magnitude: f64, hemisphere: Hemisphere) -> f64 {
    hemisphere.sign() * magnitude / 100.0
}

fn packed_degrees(caps: &Captures<'_>, magnitude: usize, hemisphere: usize) -> Option<f64> {
    let magnitude = field(caps, magnitude).value()?;
    let hemisphere = Hemisphere::from_letter(caps.get(hemisphere)?.as_str())?;

    Some(to_decimal_degrees(magnitude, hemisphere))
}

fn field(caps: &Captures<'_>, index: usize) -> NumericToken {
    NumericToken::parse(caps.get(index).map(|m| m.as_str()))
}
