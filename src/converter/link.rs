//! Trait abstraction for the conversion service socket to enable testing

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, trace};

/// Blocking byte link to the conversion service
#[cfg_attr(test, mockall::automock)]
pub trait ConverterLink: Send {
    /// Write all data and flush
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever is available into `buf` (one reply buffer)
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Apply `timeout` to every following read and write
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// TCP implementation of [`ConverterLink`]
pub struct TcpLink {
    stream: TcpStream,
}

impl TcpLink {
    /// Connect with `timeout` applied to the connect and every later read/write
    pub fn connect(addr: &SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout)?;
        stream.set_nodelay(true)?;

        let mut link = Self { stream };
        link.set_timeout(timeout)?;

        debug!("Connected to conversion service at {}", addr);
        Ok(link)
    }
}

impl ConverterLink for TcpLink {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        trace!("Converter send: {:?}", String::from_utf8_lossy(data));
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.stream.read(buf)?;
        trace!("Converter recv: {:?}", String::from_utf8_lossy(&buf[..len]));
        Ok(len)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.set_write_timeout(Some(timeout))
    }
}
