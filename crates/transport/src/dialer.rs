//! Explicit dialing seam for establishing the initial transport.
//!
//! The dialer is a construction parameter rather than ambient process
//! state, so callers that need SOCKS or other indirection can supply
//! their own implementation without touching a global.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};

/// Establishes the initial plain byte stream to a server.
pub trait Dialer {
    /// Connects to `addr` (a `host:port` string) and returns the
    /// resulting stream.
    fn dial(&self, addr: &str) -> io::Result<TcpStream>;
}

/// The default dialer: a direct TCP connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(&self, addr: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

impl TcpDialer {
    /// Resolves `addr` without connecting, for early validation.
    pub fn resolve(addr: &str) -> io::Result<std::net::SocketAddr> {
        addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{addr} resolved to no addresses"),
            )
        })
    }
}
