//! Session error taxonomy.
//!
//! Every layer fails fast: the first error aborts the operation and,
//! for construction-phase failures, the whole session. Variants keep
//! the failing step and the raw offending values so interoperability
//! mismatches can be diagnosed from the error alone.

use std::fmt;
use std::io;

use nbd_protocol::{CommandType, DecodeError, ProtocolError, ServerErrorKind};
use nbd_transport::TlsUpgradeError;
use thiserror::Error;

/// The protocol step during which a transport failure occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// Establishing the initial TCP stream.
    Dial,
    /// Exchanging the opening magics and flag words.
    Handshake,
    /// The STARTTLS option exchange.
    TlsUpgrade,
    /// Selecting the export and reading its details.
    ExportNegotiation,
    /// A transmission-phase command exchange.
    Command,
    /// Tearing the session down.
    Close,
}

impl Step {
    const fn describe(self) -> &'static str {
        match self {
            Self::Dial => "dialing the server",
            Self::Handshake => "exchanging the opening handshake",
            Self::TlsUpgrade => "negotiating the TLS upgrade",
            Self::ExportNegotiation => "negotiating the export",
            Self::Command => "exchanging a command",
            Self::Close => "closing the session",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors surfaced to session callers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying stream failed or ended early.
    #[error("transport failed while {step}: {source}")]
    Transport {
        /// The step the session was performing.
        step: Step,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A fixed field on the stream violated the protocol contract.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Building or performing the TLS handshake failed.
    #[error(transparent)]
    Tls(#[from] TlsUpgradeError),
    /// The server answered a command with a non-zero error code.
    #[error("server failed {command}: {kind} (code {code})")]
    Server {
        /// The command the server rejected.
        command: CommandType,
        /// The raw error code from the reply.
        code: u32,
        /// The classified errno meaning of the code.
        kind: ServerErrorKind,
    },
    /// A second command was requested while one was outstanding.
    #[error("cannot issue {requested} while handle {pending:#x} is in flight")]
    CommandInFlight {
        /// The command that was refused.
        requested: CommandType,
        /// The handle of the outstanding command.
        pending: u64,
    },
    /// The session was used after `close`.
    #[error("session is closed")]
    Closed,
    /// The dialed host is not a valid TLS server name.
    #[error("invalid TLS server name: {0}")]
    ServerName(#[from] nbd_transport::InvalidServerName),
}

impl ClientError {
    /// Wraps an I/O failure with the step it interrupted.
    #[must_use]
    pub const fn transport(step: Step, source: io::Error) -> Self {
        Self::Transport { step, source }
    }

    /// Lifts a codec failure, attributing its I/O half to `step`.
    #[must_use]
    pub fn from_decode(step: Step, err: DecodeError) -> Self {
        match err {
            DecodeError::Io(source) => Self::Transport { step, source },
            DecodeError::Protocol(err) => Self::Protocol(err),
        }
    }

    /// Reports whether the server rejected a negotiation option.
    #[must_use]
    pub const fn is_option_rejected(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::OptionRejected { .. }))
    }

    /// Returns the classified server error, if the server reported one.
    #[must_use]
    pub const fn server_error_kind(&self) -> Option<ServerErrorKind> {
        match self {
            Self::Server { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_name_their_step() {
        let err = ClientError::transport(
            Step::Handshake,
            io::Error::new(io::ErrorKind::UnexpectedEof, "short read"),
        );
        let message = err.to_string();
        assert!(message.contains("opening handshake"), "{message}");
    }

    #[test]
    fn decode_errors_split_into_the_taxonomy() {
        let io_side = ClientError::from_decode(
            Step::Command,
            DecodeError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
        );
        assert!(matches!(
            io_side,
            ClientError::Transport {
                step: Step::Command,
                ..
            }
        ));

        let protocol_side = ClientError::from_decode(
            Step::Command,
            DecodeError::Protocol(ProtocolError::HandleMismatch {
                expected: 1,
                actual: 2,
            }),
        );
        assert!(matches!(protocol_side, ClientError::Protocol(_)));
    }

    #[test]
    fn server_errors_expose_their_kind() {
        let err = ClientError::Server {
            command: CommandType::Read,
            code: 5,
            kind: ServerErrorKind::Io,
        };
        assert_eq!(err.server_error_kind(), Some(ServerErrorKind::Io));
        assert!(err.to_string().contains("input/output error"));
    }
}
