//! # Converter Module
//!
//! Client for the external attitude conversion service.
//!
//! This module handles:
//! - The greeting/request/reply line format
//! - A blocking TCP link behind a mockable trait
//! - The conversion client with its one-shot handshake

pub mod protocol;
pub mod link;
pub mod client;

pub use client::ConversionClient;
pub use link::{ConverterLink, TcpLink};
pub use protocol::{ConvertedAttitude, EulerAngles};
