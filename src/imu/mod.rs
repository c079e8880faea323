//! # IMU Module
//!
//! Reconstruction of IMU samples from the time-series store.
//!
//! This module handles:
//! - Parsing store rows into channel records
//! - Correlating records into complete per-group samples
//! - Two's-complement decoding of raw accelerometer/gyroscope registers
//! - The query seam to the store

pub mod signed;
pub mod record;
pub mod correlator;
pub mod channel;
pub mod source;

pub use channel::{ChannelDescriptor, ChannelGroup};
pub use correlator::{correlate, CorrelatedSample};
pub use record::{ChannelRecord, Timestamp};
pub use source::RecordSource;
