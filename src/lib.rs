//! # GPS/IMU Monitor Library
//!
//! Decoding and correlation engine for a GPS/IMU telemetry feed.
//!
//! This library turns the raw inputs of a vehicle telemetry stack into
//! last-known state:
//! - `gps1`/`gps2` tagged NMEA-style datagrams into position and orientation
//! - Per-channel IMU rows from a time-series store into complete samples
//! - Gyroscope/accelerometer pairs into a quaternion and Euler angles via an
//!   external conversion service

pub mod config;
pub mod error;
pub mod types;
pub mod gps;
pub mod imu;
pub mod converter;
pub mod aggregator;

pub use aggregator::{ImuRows, TelemetryAggregator};
pub use error::{Result, TelemetryError};
