//! # GPS Module
//!
//! Decoding of the dual-receiver GPS feed.
//!
//! This module handles:
//! - Splitting datagrams into `gps1`/`gps2` tagged sub-messages
//! - `$PTNL,AVR` orientation sentences (yaw, tilt)
//! - `$GPGGA` position sentences (fix time, latitude, longitude, altitude)
//! - Receiving datagrams over UDP

pub mod patterns;
pub mod types;
pub mod decoder;
pub mod listener;

pub use decoder::{decode, DecodedDatagram};
pub use types::{GpsSource, Hemisphere, OrientationReading, PositionFix};
