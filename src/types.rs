//! # Shared Value Types
//!
//! Values that both the GPS and IMU paths produce: optional numeric tokens and
//! wall-clock fix times.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};

/// An optional signed decimal read from a sentence or reply field.
///
/// An empty field decodes to [`NumericToken::Missing`]. It is never coerced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NumericToken {
    /// Field was present but empty
    #[default]
    Missing,
    /// Field carried a number
    Value(f64),
}

impl NumericToken {
    /// Parse a captured field. `None`, empty or unparsable text is `Missing`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gps_imu_monitor::types::NumericToken;
    ///
    /// assert_eq!(NumericToken::parse(Some("+1.5")), NumericToken::Value(1.5));
    /// assert_eq!(NumericToken::parse(Some("")), NumericToken::Missing);
    /// assert_eq!(NumericToken::parse(None), NumericToken::Missing);
    /// ```
    pub fn parse(field: Option<&str>) -> Self {
        match field {
            Some(text) if !text.is_empty() => text
                .parse::<f64>()
                .map(NumericToken::Value)
                .unwrap_or(NumericToken::Missing),
            _ => NumericToken::Missing,
        }
    }

    /// The carried number, if any.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericToken::Value(v) => Some(*v),
            NumericToken::Missing => None,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, NumericToken::Missing)
    }

    /// Keep `self` when it carries a value, otherwise fall back to `prior`.
    #[must_use]
    pub fn or(self, prior: NumericToken) -> NumericToken {
        match self {
            NumericToken::Value(_) => self,
            NumericToken::Missing => prior,
        }
    }
}

impl From<f64> for NumericToken {
    fn from(value: f64) -> Self {
        NumericToken::Value(value)
    }
}

/// Honors width/precision flags, so `{:.3}` works on a token.
impl fmt::Display for NumericToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericToken::Value(v) => fmt::Display::fmt(v, f),
            NumericToken::Missing => f.pad("nan"),
        }
    }
}

/// Hours, minutes and whole seconds of a UTC fix or sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl TimeOfDay {
    /// Build a time of day, rejecting out-of-range components.
    ///
    /// A leap second (`seconds == 60`) is accepted, GPS receivers emit it.
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        if hours > 23 || minutes > 59 || seconds > 60 {
            return None;
        }
        Some(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }
}

/// Sub-second precision is dropped.
impl From<&DateTime<Utc>> for TimeOfDay {
    fn from(instant: &DateTime<Utc>) -> Self {
        Self {
            hours: instant.hour() as u8,
            minutes: instant.minute() as u8,
            // chrono reports a leap second through nanoseconds, not seconds
            seconds: instant.second() as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}
