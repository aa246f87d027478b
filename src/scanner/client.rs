//! UDP client for one thermal scanner.
//!
//! The client owns a single socket bound to the scanner's port.  Receives
//! block until a datagram arrives (or the optional read timeout expires).
//! During shutdown a [`ScannerWaker`] sends a one-byte datagram to the
//! socket over loopback so a pending receive returns.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use log::{debug, info};

use super::{ScannerFrame, parse_frame};
use crate::error::{Error, Result};

/// Payload of the local wake-up datagram.
pub const WAKE_PAYLOAD: &[u8] = b"0";

/// One bound scanner socket.
pub struct ThermalScannerClient {
    socket: UdpSocket,
    buf: Vec<u8>,
    local_addr: SocketAddr,
}

impl ThermalScannerClient {
    /// Bind to `ip:port`.  Port 0 picks an ephemeral port (tests).
    pub fn bind(
        ip: &str,
        port: u16,
        recv_buffer_bytes: usize,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind((ip, port))?;
        socket.set_read_timeout(read_timeout)?;
        let local_addr = socket.local_addr()?;
        info!("Thermal scanner socket bound on {local_addr}");
        Ok(Self {
            socket,
            buf: vec![0u8; recv_buffer_bytes],
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block for one datagram and return its raw bytes.
    ///
    /// Returns `Ok(None)` when the read timeout expires with nothing received.
    pub fn receive_raw(&mut self) -> Result<Option<&[u8]>> {
        match self.socket.recv_from(&mut self.buf) {
            Ok((len, from)) => {
                debug!("{} bytes from {} on {}", len, from, self.local_addr);
                Ok(Some(&self.buf[..len]))
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Block for one datagram and decode it.
    ///
    /// `Ok(None)` on timeout; a decode failure is returned as
    /// [`Error::Scanner`].
    pub fn receive(&mut self) -> Result<Option<ScannerFrame>> {
        match self.receive_raw()? {
            Some(bytes) => Ok(Some(parse_frame(bytes)?)),
            None => Ok(None),
        }
    }

    /// A handle that can unblock this socket from another thread.
    pub fn waker(&self) -> ScannerWaker {
        ScannerWaker {
            port: self.local_addr.port(),
        }
    }
}

/// Sends the loopback wake-up datagram to a scanner socket.
#[derive(Debug, Clone, Copy)]
pub struct ScannerWaker {
    port: u16,
}

impl ScannerWaker {
    pub fn wake(&self) -> Result<()> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))?;
        socket.send_to(WAKE_PAYLOAD, (Ipv4Addr::LOCALHOST, self.port))?;
        debug!("Sent wake-up datagram to port {}", self.port);
        Ok(())
    }
}
