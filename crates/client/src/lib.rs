#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Session engine for the NBD fixed-newstyle client.
//!
//! A [`Session`] walks the strict sequence the protocol mandates:
//! validate the server greeting, answer with client flags, upgrade the
//! transport to TLS in band, negotiate the export lazily on first use,
//! then exchange read commands one at a time. Every step is a blocking
//! request/response on one exclusively-owned transport.
//!
//! # Errors
//!
//! All failures are fail-fast and surface through [`ClientError`],
//! which separates transport I/O failures, protocol-contract
//! violations, option rejections, TLS failures, and server-reported
//! command errors. A failed session or command leaves the transport in
//! an undefined state; the session must not be reused.
//!
//! # Examples
//!
//! ```no_run
//! use nbd_client::Session;
//!
//! # fn main() -> Result<(), nbd_client::ClientError> {
//! let mut session = Session::builder("storage.example:10809", "vm-disk")
//!     .connect()?;
//! let block = session.read(512, 4096)?;
//! assert_eq!(block.len(), 4096);
//! session.close()?;
//! # Ok(())
//! # }
//! ```

mod command;
mod error;
mod handle;
mod handshake;
mod negotiate;
mod session;
#[cfg(test)]
mod test_support;

pub use error::{ClientError, Step};
pub use session::{Session, SessionBuilder};

// Re-exported so callers can consume session results without naming
// the codec crate directly.
pub use nbd_protocol::{ExportDetails, ServerErrorKind, TransmissionFlags};
pub use nbd_transport::{Dialer, TcpDialer};
