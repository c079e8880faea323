//! # GPS Reading Types
//!
//! Decoded orientation and position readings from the receiver pair.

use std::fmt;

use crate::types::{NumericToken, TimeOfDay};

/// Receiver that emitted a sub-message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpsSource {
    Gps1,
    Gps2,
}

impl GpsSource {
    /// Match a sub-message tag (`gps1` / `gps2`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "gps1" => Some(GpsSource::Gps1),
            "gps2" => Some(GpsSource::Gps2),
            _ => None,
        }
    }
}

impl fmt::Display for GpsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpsSource::Gps1 => f.write_str("GPS1"),
            GpsSource::Gps2 => f.write_str("GPS2"),
        }
    }
}

/// Hemisphere letter following a latitude or longitude magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }

    /// `-1.0` for south and west, `1.0` otherwise.
    pub fn sign(&self) -> f64 {
        match self {
            Hemisphere::South | Hemisphere::West => -1.0,
            Hemisphere::North | Hemisphere::East => 1.0,
        }
    }
}

/// Heading/tilt pair from a `$PTNL,AVR` sentence
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationReading {
    /// Yaw in degrees
    pub yaw: NumericToken,

    /// Tilt in degrees
    pub tilt: NumericToken,
}

impl OrientationReading {
    /// Overlay a newer reading on this one, field by field.
    ///
    /// Fields missing from `newer` keep their current value.
    #[must_use]
    pub fn merge(&self, newer: &OrientationReading) -> OrientationReading {
        OrientationReading {
            yaw: newer.yaw.or(self.yaw),
            tilt: newer.tilt.or(self.tilt),
        }
    }
}

/// One complete `$GPGGA` fix.
///
/// Latitude and longitude are the raw `DDMM.MMMM` magnitude divided by 100
/// with the hemisphere sign applied. This is not a true minutes-to-degrees
/// conversion (that would divide the minutes by 60). Check absolute positions
/// against real fix data before trusting them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// UTC time of the fix
    pub time: TimeOfDay,

    /// Signed latitude, `S` negative
    pub latitude: f64,

    /// Signed longitude, `W` negative
    pub longitude: f64,

    /// Altitude in meters
    pub altitude: NumericToken,

    /// Fix quality indicator (0 = invalid, 1 = GPS, 2 = DGPS, ...)
    pub fix_quality: NumericToken,

    /// Satellites in use
    pub satellites: NumericToken,

    /// Horizontal dilution of precision
    pub hdop: NumericToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tags() {
        assert_eq!(GpsSource::from_tag("gps1"), Some(GpsSource::Gps1));
        assert_eq!(GpsSource::from_tag("gps2"), Some(GpsSource::Gps2));
        assert_eq!(GpsSource::from_tag("GPS1"), None);
        assert_eq!(GpsSource::Gps2.to_string(), "GPS2");
    }

    #[test]
    fn test_hemisphere_signs() {
        assert_eq!(Hemisphere::from_letter("S").unwrap().sign(), -1.0);
        assert_eq!(Hemisphere::from_letter("W").unwrap().sign(), -1.0);
        assert_eq!(Hemisphere::from_letter("N").unwrap().sign(), 1.0);
        assert_eq!(Hemisphere::from_letter("E").unwrap().sign(), 1.0);
        assert!(Hemisphere::from_letter("X").is_none());
    }

    #[test]
    fn test_merge_keeps_prior_for_missing_fields() {
        let prior = OrientationReading {
            yaw: NumericToken::Value(90.0),
            tilt: NumericToken::Value(1.5),
        };
        let newer = OrientationReading {
            yaw: NumericToken::Missing,
            tilt: NumericToken::Value(2.0),
        };

        let merged = prior.merge(&newer);
        assert_eq!(merged.yaw, NumericToken::Value(90.0));
        assert_eq!(merged.tilt, NumericToken::Value(2.0));
    }

    #[test]
    fn test_default_reading_is_missing() {
        let reading = OrientationReading::default();
        assert!(reading.yaw.is_missing());
        assert!(reading.tilt.is_missing());
    }
}
