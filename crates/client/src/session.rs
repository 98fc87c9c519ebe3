//! Session lifecycle over a negotiated transport.
//!
//! A session owns its transport exclusively and drives every exchange
//! synchronously: handshake, mandatory TLS upgrade, lazy export
//! negotiation on first use, then repeatable read commands. Any
//! failure leaves the transport state undefined; the session must not
//! be reused after an error.

use nbd_protocol::{CommandType, ExportDetails};
use nbd_transport::{Connection, Dialer, TcpDialer, TlsParameters, Transport};
use tracing::debug;

use crate::command;
use crate::error::{ClientError, Step};
use crate::handle::HandleAllocator;
use crate::handshake;
use crate::negotiate;

/// Construction parameters for a [`Session`] over TCP.
///
/// The dialer and the peer-verification policy are explicit inputs;
/// neither falls back to ambient process state.
#[derive(Debug)]
pub struct SessionBuilder {
    addr: String,
    export_name: Vec<u8>,
    verify_peer: bool,
}

impl SessionBuilder {
    /// Targets `addr` (`host:port`) and the named export.
    pub fn new(addr: impl Into<String>, export_name: impl Into<Vec<u8>>) -> Self {
        Self {
            addr: addr.into(),
            export_name: export_name.into(),
            verify_peer: true,
        }
    }

    /// Disables verification of the server's TLS certificate.
    ///
    /// The channel stays encrypted but the peer is unauthenticated.
    #[must_use]
    pub fn danger_disable_peer_verification(mut self) -> Self {
        self.verify_peer = false;
        self
    }

    /// Connects through the default TCP dialer.
    pub fn connect(self) -> Result<Session, ClientError> {
        self.connect_with(&TcpDialer)
    }

    /// Connects through `dialer`, handshakes, and upgrades to TLS.
    ///
    /// Construction fails fast on any magic mismatch, rejected
    /// STARTTLS, or TLS handshake failure; the half-open transport is
    /// dropped in that case.
    pub fn connect_with<D: Dialer>(self, dialer: &D) -> Result<Session, ClientError> {
        let mut params = TlsParameters::new(host_of(&self.addr))?;
        if !self.verify_peer {
            params = params.danger_disable_peer_verification();
        }

        let socket = dialer
            .dial(&self.addr)
            .map_err(|err| ClientError::transport(Step::Dial, err))?;
        let mut conn = Connection::Plain(socket);

        handshake::negotiate_fixed_newstyle(&mut conn)?;
        handshake::request_starttls(&mut conn)?;
        let conn = conn.upgrade_to_tls(&params)?;
        debug!(addr = %self.addr, "session transport established");

        Ok(Session::from_transport(conn, self.export_name))
    }
}

/// A live client session against one export.
///
/// Sessions are single-flight by design: one command may be
/// outstanding at a time, and the type is not meant to be shared
/// across threads without external synchronization.
#[derive(Debug)]
pub struct Session<T: Transport = Connection> {
    transport: T,
    export_name: Vec<u8>,
    handles: HandleAllocator,
    export: Option<ExportDetails>,
    connected: bool,
    closed: bool,
}

impl Session {
    /// Starts building a TCP session against `addr` and `export_name`.
    pub fn builder(addr: impl Into<String>, export_name: impl Into<Vec<u8>>) -> SessionBuilder {
        SessionBuilder::new(addr, export_name)
    }
}

impl<T: Transport> Session<T> {
    /// Wraps an already handshaken and upgraded transport.
    ///
    /// The stream must be positioned exactly after the client flag
    /// word and TLS upgrade, ready for negotiation-phase options.
    pub fn from_transport(transport: T, export_name: impl Into<Vec<u8>>) -> Self {
        Self {
            transport,
            export_name: export_name.into(),
            handles: HandleAllocator::new(),
            export: None,
            connected: false,
            closed: false,
        }
    }

    /// Returns the export name this session targets.
    #[must_use]
    pub fn export_name(&self) -> &[u8] {
        &self.export_name
    }

    /// Reports whether export negotiation has completed.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the negotiated export details, if negotiation ran.
    #[must_use]
    pub const fn export(&self) -> Option<ExportDetails> {
        self.export
    }

    /// Negotiates the export if that has not happened yet.
    ///
    /// `read` calls this implicitly; it is public so callers can force
    /// the exchange early and inspect the export details.
    pub fn ensure_connected(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Err(ClientError::Closed);
        }
        if self.connected {
            return Ok(());
        }

        let details = negotiate::negotiate_export(&mut self.transport, &self.export_name)?;
        self.export = Some(details);
        self.connected = true;
        Ok(())
    }

    /// Reads exactly `length` bytes starting at `offset`.
    ///
    /// The first read negotiates the export. The returned buffer is
    /// owned by the caller and has exactly `length` bytes on success.
    pub fn read(&mut self, offset: u64, length: u32) -> Result<Vec<u8>, ClientError> {
        self.ensure_connected()?;

        let handle = self
            .handles
            .acquire()
            .map_err(|pending| ClientError::CommandInFlight {
                requested: CommandType::Read,
                pending,
            })?;
        let result = command::read_block(&mut self.transport, handle, offset, length);
        self.handles.release(handle);
        result
    }

    /// Tears the session down.
    ///
    /// If the export was negotiated, a disconnect command is sent
    /// best-effort before the transport is shut down: a failed
    /// goodbye does not prevent the shutdown but is surfaced to the
    /// caller. Closing an already-closed session does nothing and
    /// succeeds.
    pub fn close(&mut self) -> Result<(), ClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let goodbye = if self.connected {
            command::send_disconnect(&mut self.transport)
        } else {
            Ok(())
        };
        let shutdown = self
            .transport
            .shutdown()
            .map_err(|err| ClientError::transport(Step::Close, err));

        debug!("session closed");
        goodbye.and(shutdown)
    }
}

/// Extracts the host portion of a `host:port` address for SNI.
///
/// Bracketed IPv6 literals lose their brackets; an address without a
/// port is returned unchanged.
fn host_of(addr: &str) -> &str {
    if let Some(host) = addr.strip_prefix('[') {
        if let Some((inside, _)) = host.split_once(']') {
            return inside;
        }
    }
    match addr.rsplit_once(':') {
        // A second colon means an unbracketed IPv6 literal.
        Some((host, _)) if !host.contains(':') => host,
        _ => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryTransport;
    use nbd_protocol::{EXPORT_PADDING_LEN, OPTS_MAGIC, SIMPLE_REPLY_MAGIC};

    fn export_details(size: u64, flags: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&size.to_be_bytes());
        bytes.extend_from_slice(&flags.to_be_bytes());
        bytes.extend_from_slice(&[0u8; EXPORT_PADDING_LEN]);
        bytes
    }

    fn read_reply(handle: u64, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&SIMPLE_REPLY_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&handle.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn first_read_negotiates_the_export_exactly_once() {
        let mut input = export_details(1 << 20, 0);
        input.extend_from_slice(&read_reply(1, &[0xaa; 8]));
        input.extend_from_slice(&read_reply(2, &[0xbb; 8]));

        let mut session = Session::from_transport(MemoryTransport::new(&input), "test");
        assert!(!session.is_connected());

        let first = session.read(0, 8).expect("first read succeeds");
        assert_eq!(first, [0xaa; 8]);
        assert!(session.is_connected());
        assert_eq!(session.export().map(ExportDetails::size), Some(1 << 20));

        let second = session.read(8, 8).expect("second read succeeds");
        assert_eq!(second, [0xbb; 8]);

        // Exactly one EXPORT_NAME request went out, before the first
        // read command.
        let writes = session.transport.writes();
        let opts_magic = OPTS_MAGIC.to_be_bytes();
        let negotiations = writes
            .windows(opts_magic.len())
            .filter(|window| *window == opts_magic)
            .count();
        assert_eq!(negotiations, 1);
        assert_eq!(&writes[..8], &opts_magic);
    }

    #[test]
    fn sequential_reads_use_fresh_handles() {
        let mut input = export_details(1 << 20, 0);
        input.extend_from_slice(&read_reply(1, &[0; 4]));
        input.extend_from_slice(&read_reply(2, &[0; 4]));

        let mut session = Session::from_transport(MemoryTransport::new(&input), "test");
        session.read(0, 4).expect("first read");
        session.read(4, 4).expect("second read");

        let writes = session.transport.writes();
        // EXPORT_NAME request: 16 bytes envelope + 4 bytes name.
        let first_request = &writes[20..48];
        let second_request = &writes[48..76];
        assert_eq!(&first_request[8..16], &1u64.to_be_bytes());
        assert_eq!(&second_request[8..16], &2u64.to_be_bytes());
    }

    #[test]
    fn close_before_negotiation_sends_no_disconnect() {
        let mut session = Session::from_transport(MemoryTransport::new(&[]), "test");
        session.close().expect("close succeeds");
        assert!(session.transport.writes().is_empty());
        assert_eq!(session.transport.shutdowns(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let input = export_details(1 << 20, 0);
        let mut session = Session::from_transport(MemoryTransport::new(&input), "test");
        session.ensure_connected().expect("negotiation succeeds");

        session.close().expect("first close succeeds");
        let writes_after_first = session.transport.writes().len();
        assert_eq!(session.transport.shutdowns(), 1);

        session.close().expect("second close is a no-op");
        assert_eq!(session.transport.writes().len(), writes_after_first);
        assert_eq!(session.transport.shutdowns(), 1);
    }

    #[test]
    fn reads_after_close_are_refused() {
        let mut session = Session::from_transport(MemoryTransport::new(&[]), "test");
        session.close().expect("close succeeds");
        assert!(matches!(
            session.read(0, 16),
            Err(ClientError::Closed)
        ));
    }

    #[test]
    fn host_extraction_handles_the_common_shapes() {
        assert_eq!(host_of("example.com:10809"), "example.com");
        assert_eq!(host_of("127.0.0.1:10809"), "127.0.0.1");
        assert_eq!(host_of("[::1]:10809"), "::1");
        assert_eq!(host_of("::1"), "::1");
        assert_eq!(host_of("bare-host"), "bare-host");
    }
}
