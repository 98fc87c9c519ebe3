//! The exclusively-owned byte stream a session performs I/O on.
//!
//! A connection starts as a plain TCP stream and may be upgraded in
//! place to a TLS wrapper around the same socket. After the upgrade
//! every read and write goes through the wrapper; the plain stream is
//! consumed by the upgrade and can no longer be touched directly.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use rustls::{ClientConnection, StreamOwned};
use thiserror::Error;

use crate::tls::TlsParameters;

/// A bidirectional byte stream the protocol engine can drive.
///
/// Both the plain and the encrypted stream honor the same
/// read/write-exact contract, so the engine stays agnostic to which
/// one it holds.
pub trait Transport: Read + Write {
    /// Closes both directions of the stream.
    ///
    /// Buffered TLS close data is not flushed; the session layer sends
    /// its protocol-level goodbye before calling this.
    fn shutdown(&mut self) -> io::Result<()>;
}

/// Failure while upgrading a connection to TLS.
#[derive(Debug, Error)]
pub enum TlsUpgradeError {
    /// The TLS configuration was rejected by rustls.
    #[error("TLS configuration rejected: {0}")]
    Config(#[from] rustls::Error),
    /// The TLS handshake with the server failed.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[from] io::Error),
    /// The connection already carries a TLS wrapper.
    #[error("connection is already encrypted")]
    AlreadyEncrypted,
}

/// A session transport: plain TCP or a TLS wrapper around it.
#[derive(Debug)]
pub enum Connection {
    /// The initial unencrypted stream.
    Plain(TcpStream),
    /// The stream after the in-band TLS upgrade.
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Connection {
    /// Replaces the plain stream with a TLS wrapper around the same
    /// socket, driving the client-side handshake to completion.
    ///
    /// The upgrade consumes `self`; on handshake failure the socket is
    /// dropped, matching the fail-fast session policy. Upgrading an
    /// already-encrypted connection is an error.
    pub fn upgrade_to_tls(self, params: &TlsParameters) -> Result<Self, TlsUpgradeError> {
        let Self::Plain(mut socket) = self else {
            return Err(TlsUpgradeError::AlreadyEncrypted);
        };

        let config = params.client_config()?;
        let mut tls =
            ClientConnection::new(config.into(), params.server_name().clone())?;
        while tls.is_handshaking() {
            tls.complete_io(&mut socket)?;
        }

        Ok(Self::Tls(Box::new(StreamOwned::new(tls, socket))))
    }

    /// Reports whether the connection is encrypted.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

impl Transport for Connection {
    fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.shutdown(Shutdown::Both),
            Self::Tls(stream) => {
                stream.conn.send_close_notify();
                // Flush the close_notify if the peer still reads; a
                // peer that already hung up is not an error here.
                let _ = stream.flush();
                stream.sock.shutdown(Shutdown::Both)
            }
        }
    }
}
