#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Transport adapters for the NBD client.
//!
//! The crate owns everything below the protocol engine: establishing
//! the initial TCP stream through an explicit [`Dialer`], wrapping it
//! in the [`Connection`] the session performs I/O on, and upgrading
//! that connection in place to TLS when the server acknowledges the
//! STARTTLS option.
//!
//! # Invariants
//!
//! - A session drives exactly one [`Connection`]; after
//!   [`Connection::upgrade_to_tls`] the plain stream is consumed and
//!   all further I/O goes through the TLS wrapper.
//! - Peer verification is controlled solely by [`TlsParameters`];
//!   there is no ambient insecure default.
//! - The dialer is passed at construction; no process-wide default
//!   dialer exists.

mod connection;
mod dialer;
mod tls;

pub use connection::{Connection, TlsUpgradeError, Transport};
pub use dialer::{Dialer, TcpDialer};
pub use tls::TlsParameters;

/// Error returned when a dialed host is not a valid TLS server name.
pub use rustls_pki_types::InvalidDnsNameError as InvalidServerName;
