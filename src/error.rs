//! # Error Types
//!
//! Custom error types for the GPS/IMU monitor using `thiserror`.

use thiserror::Error;

/// Main error type for the GPS/IMU monitor
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Query rows that are not valid JSON
    #[error("Query row error: {0}")]
    Json(#[from] serde_json::Error),

    /// GPS datagram errors
    #[error("GPS decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Attitude conversion errors
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// The time-series store could not answer a query
    #[error("Record source error: {0}")]
    Source(String),
}

/// Failure to decode a GPS datagram.
///
/// Structural mismatches are not errors; they simply produce no update.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Datagram payload is not valid UTF-8 text
    #[error("datagram is not valid UTF-8 (invalid byte at offset {valid_up_to})")]
    Encoding { valid_up_to: usize },
}

/// Failure of one round trip through the attitude conversion service.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Handshake never succeeded; the client is disabled
    #[error("conversion service unavailable")]
    Unavailable,

    /// No reply within the caller-supplied timeout
    #[error("conversion service timed out")]
    Timeout,

    /// Reply did not contain a quaternion/Euler record
    #[error("malformed conversion reply: {0:?}")]
    MalformedReply(String),

    /// Socket failure other than a timeout
    #[error("conversion link error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Map a socket error, folding read/write timeouts into [`ConvertError::Timeout`].
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => ConvertError::Timeout,
            _ => ConvertError::Io(err),
        }
    }
}

/// Result type alias for the GPS/IMU monitor
pub type Result<T> = std::result::Result<T, TelemetryError>;
