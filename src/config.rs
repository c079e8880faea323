//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; a missing file section takes the
//! defaults listed next to each field.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TelemetryError};
use crate::imu::ChannelDescriptor;
use crate::imu::ChannelGroup;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gps: GpsConfig,

    #[serde(default)]
    pub imu: ImuConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GPS datagram listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GpsConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_gps_port")]
    pub port: u16,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// IMU query and correlation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ImuConfig {
    /// Look-back window of each store query, in seconds
    #[serde(default = "default_query_interval_s")]
    pub query_interval_s: u64,

    /// Largest gap between the first and last record of a cycle, in seconds
    #[serde(default = "default_tolerance_s")]
    pub tolerance_s: f64,
}

/// Attitude conversion service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_enabled")]
    pub enabled: bool,

    #[serde(default = "default_converter_host")]
    pub host: String,

    #[serde(default = "default_converter_port")]
    pub port: u16,

    #[serde(default = "default_converter_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Empty for console only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_gps_port() -> u16 { 6003 }
fn default_buffer_size() -> usize { 1024 }

fn default_query_interval_s() -> u64 { 2 }
fn default_tolerance_s() -> f64 { 1.0 }

fn default_converter_enabled() -> bool { true }
fn default_converter_host() -> String { "127.0.0.1".to_string() }
fn default_converter_port() -> u16 { 5000 }
fn default_converter_timeout_ms() -> u64 { 1000 }

fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_gps_port(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            query_interval_s: default_query_interval_s(),
            tolerance_s: default_tolerance_s(),
        }
    }
}

impl ImuConfig {
    /// Correlator descriptors for every channel group, in update order
    pub fn descriptors(&self) -> [ChannelDescriptor; 3] {
        ChannelGroup::ALL.map(|group| group.descriptor(self.tolerance_s))
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            enabled: default_converter_enabled(),
            host: default_converter_host(),
            port: default_converter_port(),
            timeout_ms: default_converter_timeout_ms(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gps_imu_monitor::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.gps.bind_address.is_empty() {
            return Err(invalid("gps bind_address cannot be empty"));
        }

        if self.gps.buffer_size == 0 || self.gps.buffer_size > 65535 {
            return Err(invalid("gps buffer_size must be between 1 and 65535"));
        }

        if self.imu.query_interval_s == 0 || self.imu.query_interval_s > 3600 {
            return Err(invalid("query_interval_s must be between 1 and 3600"));
        }

        if !self.imu.tolerance_s.is_finite() || self.imu.tolerance_s <= 0.0 {
            return Err(invalid("tolerance_s must be a finite number greater than 0"));
        }

        // Converter fields only matter when it is used
        if self.converter.enabled {
            if self.converter.host.is_empty() {
                return Err(invalid("converter host cannot be empty when enabled"));
            }

            if self.converter.port == 0 {
                return Err(invalid("converter port cannot be 0"));
            }
        }

        if self.converter.timeout_ms == 0 || self.converter.timeout_ms > 60000 {
            return Err(invalid("converter timeout_ms must be between 1 and 60000"));
        }

        if self.converter.buffer_size == 0 || self.converter.buffer_size > 65535 {
            return Err(invalid("converter buffer_size must be between 1 and 65535"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "logging level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
