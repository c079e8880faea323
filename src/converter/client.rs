//! # Conversion Client
//!
//! Round trips correlated gyroscope/accelerometer samples through the
//! attitude conversion service.
//!
//! The client checks the service greeting once, at construction. If the
//! handshake fails the client stays disabled for its whole life and every
//! [`convert`](ConversionClient::convert) call fails fast with
//! [`ConvertError::Unavailable`] without touching the network.
//!
//! Each call is one blocking send and one blocking read under the
//! configured timeout. Async callers should run it on a blocking worker
//! (`tokio::task::spawn_blocking`). The client never retries.
//!
//! Requests and replies are paired by order only. A timed-out or failed
//! exchange leaves the stream out of step, so the link is closed and the
//! client is disabled from then on.

use std::io;
use std::net::ToSocketAddrs;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::link::{ConverterLink, TcpLink};
use super::protocol::{format_request, parse_reply, ConvertedAttitude, GREETING};
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::imu::CorrelatedSample;

/// Default conversion service port
pub const DEFAULT_CONVERTER_PORT: u16 = 5000;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default reply buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Conversion service client
pub struct ConversionClient {
    /// `None` when the handshake failed or an exchange broke the stream
    link: Option<Box<dyn ConverterLink>>,
    buffer_size: usize,
}

impl std::fmt::Debug for ConversionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionClient")
            .field("enabled", &self.is_enabled())
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}

impl ConversionClient {
    /// A client that never talks to a service
    pub fn disabled() -> Self {
        Self {
            link: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Build the client described by the `[converter]` configuration section
    pub fn from_config(config: &ConverterConfig) -> Self {
        if !config.enabled {
            info!("Conversion service disabled by configuration");
            return Self::disabled();
        }

        Self::connect(
            (config.host.as_str(), config.port),
            Duration::from_millis(config.timeout_ms),
            config.buffer_size,
        )
    }

    /// Connect to the service and check its greeting
    ///
    /// # Arguments
    ///
    /// * `addr` - Service address, e.g. `("127.0.0.1", 5000)`
    /// * `timeout` - Applied to the connect and every later read/write
    /// * `buffer_size` - Size of the greeting and reply buffers
    ///
    /// # Returns
    ///
    /// An enabled client if the greeting was exactly `Imu conv`, a disabled
    /// one otherwise. Connection failures are logged, not returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use gps_imu_monitor::converter::ConversionClient;
    ///
    /// let client = ConversionClient::connect(("127.0.0.1", 5000), Duration::from_secs(1), 1024);
    /// if !client.is_enabled() {
    ///     println!("conversion service not available");
    /// }
    /// ```
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration, buffer_size: usize) -> Self {
        let resolved = match addr.to_socket_addrs() {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                warn!("Cannot resolve conversion service address: {}", e);
                None
            }
        };

        let Some(resolved) = resolved else {
            return Self::disabled();
        };

        match TcpLink::connect(&resolved, timeout) {
            Ok(link) => Self::with_link(Box::new(link), buffer_size),
            Err(e) => {
                warn!("Cannot connect to conversion service at {}: {}", resolved, e);
                Self::disabled()
            }
        }
    }

    /// Run the greeting check over an already open link
    pub fn with_link(mut link: Box<dyn ConverterLink>, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(GREETING.len());
        let mut greeting = vec![0u8; buffer_size];

        match link.receive(&mut greeting) {
            Ok(len) if &greeting[..len] == GREETING => {
                info!("Imu converter ready");
                Self {
                    link: Some(link),
                    buffer_size,
                }
            }
            Ok(len) => {
                warn!(
                    "Unexpected conversion service greeting {:?}",
                    String::from_utf8_lossy(&greeting[..len])
                );
                Self::disabled()
            }
            Err(e) => {
                warn!("No conversion service greeting: {}", e);
                Self::disabled()
            }
        }
    }

    /// True while the link is open
    pub fn is_enabled(&self) -> bool {
        self.link.is_some()
    }

    /// Change the per-call timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Unavailable`] on a disabled client
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ConvertError> {
        let link = self.link.as_mut().ok_or(ConvertError::Unavailable)?;
        link.set_timeout(timeout).map_err(ConvertError::from_io)
    }

    /// Convert one gyroscope/accelerometer pair
    ///
    /// # Errors
    ///
    /// - [`ConvertError::Unavailable`] if the handshake failed (no I/O is attempted)
    /// - [`ConvertError::Timeout`] if the service does not answer in time
    /// - [`ConvertError::MalformedReply`] if the reply holds no attitude record
    /// - [`ConvertError::Io`] for any other socket failure, including the service
    ///   closing the connection
    ///
    /// After a `Timeout` or `Io` error the link is closed and every later call
    /// returns [`ConvertError::Unavailable`]. A malformed reply keeps the link.
    pub fn convert(
        &mut self,
        gyro: &CorrelatedSample,
        accel: &CorrelatedSample,
    ) -> Result<ConvertedAttitude, ConvertError> {
        let link = self.link.as_mut().ok_or(ConvertError::Unavailable)?;

        let request = format_request(gyro, accel);
        let mut reply = vec![0u8; self.buffer_size];

        let len = match exchange(link.as_mut(), request.as_bytes(), &mut reply) {
            Ok(len) => len,
            Err(e) => {
                warn!("Closing conversion link after failed exchange: {}", e);
                self.link = None;
                return Err(ConvertError::from_io(e));
            }
        };

        let text = std::str::from_utf8(&reply[..len])
            .map_err(|_| ConvertError::MalformedReply(String::from_utf8_lossy(&reply[..len]).into_owned()))?;

        let attitude = parse_reply(text)?;
        debug!("Converted attitude: {}", attitude);
        Ok(attitude)
    }
}

/// One request and the read of its reply
fn exchange(link: &mut dyn ConverterLink, request: &[u8], reply: &mut [u8]) -> io::Result<usize> {
    link.send(request)?;

    let len = link.receive(reply)?;
    if len == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "conversion service closed the connection",
        ));
    }
    Ok(len)
}
