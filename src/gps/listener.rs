//! # GPS Datagram Listener
//!
//! Receives the receivers' UDP datagrams.

use std::net::SocketAddr;

use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::{info, trace};

use crate::config::GpsConfig;
use crate::error::Result;

/// Default UDP port the receivers send to
pub const DEFAULT_GPS_PORT: u16 = 6003;

/// Default receive buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// UDP listener for GPS datagrams
///
/// Owns the socket and one receive buffer; each datagram borrows the buffer
/// until the next receive.
pub struct GpsListener {
    socket: UdpSocket,
    buffer: Vec<u8>,
    local_addr: SocketAddr,
}

impl std::fmt::Debug for GpsListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpsListener")
            .field("local_addr", &self.local_addr)
            .field("buffer_size", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl GpsListener {
    /// Bind the listener described by the `[gps]` configuration section
    pub async fn from_config(config: &GpsConfig) -> Result<Self> {
        Self::bind((config.bind_address.as_str(), config.port), config.buffer_size).await
    }

    /// Bind a UDP socket
    ///
    /// # Arguments
    ///
    /// * `addr` - Local address, e.g. `"0.0.0.0:6003"` or `("::", 6003)`
    /// * `buffer_size` - Largest datagram kept; longer ones are truncated
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound
    pub async fn bind<A: ToSocketAddrs>(addr: A, buffer_size: usize) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        info!("Listening for GPS datagrams on {}", local_addr);

        Ok(Self {
            socket,
            buffer: vec![0u8; buffer_size],
            local_addr,
        })
    }

    /// Wait for the next datagram
    ///
    /// # Returns
    ///
    /// * `Result<(&[u8], SocketAddr)>` - Payload and sender
    pub async fn recv_datagram(&mut self) -> Result<(&[u8], SocketAddr)> {
        let (len, peer) = self.socket.recv_from(&mut self.buffer).await?;
        trace!("Received {} bytes from {}", len, peer);
        Ok((&self.buffer[..len], peer))
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
