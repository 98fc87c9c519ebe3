//! Error types shared by the wire codec.
//!
//! Every fixed field whose value fails to match its expected constant
//! is a fatal protocol mismatch; the codec never attempts to
//! resynchronize the stream. The variants carry the raw offending
//! value next to the expectation so interoperability mismatches can be
//! diagnosed from the error alone.

use std::io;

use thiserror::Error;

use crate::constants::{
    NBD_MAGIC, OPTION_REPLY_FLAG_ERROR, OPTION_REPLY_MAGIC, OPTS_MAGIC, SIMPLE_REPLY_MAGIC,
};
use crate::option::OptionCode;

/// Identifies which fixed magic field violated its expected constant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MagicField {
    /// The 8-byte `NBDMAGIC` field opening the server greeting.
    Protocol,
    /// The 8-byte `IHAVEOPT` field following the protocol magic.
    Options,
    /// The 8-byte magic opening an option reply envelope.
    OptionReply,
    /// The 4-byte magic opening a simple command reply.
    CommandReply,
}

impl MagicField {
    /// Returns the constant the field was expected to hold.
    #[must_use]
    pub const fn expected(self) -> u64 {
        match self {
            Self::Protocol => NBD_MAGIC,
            Self::Options => OPTS_MAGIC,
            Self::OptionReply => OPTION_REPLY_MAGIC,
            Self::CommandReply => SIMPLE_REPLY_MAGIC as u64,
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Protocol => "protocol magic",
            Self::Options => "options magic",
            Self::OptionReply => "option reply magic",
            Self::CommandReply => "command reply magic",
        }
    }
}

/// A fixed field on the stream violated the protocol contract.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ProtocolError {
    /// A magic field did not equal its fixed constant.
    #[error(
        "bad {} {actual:#x} (expected {:#x})",
        .field.describe(),
        .field.expected()
    )]
    BadMagic {
        /// Which magic field was violated.
        field: MagicField,
        /// The raw value read from the stream.
        actual: u64,
    },
    /// The server greeting lacked the fixed-newstyle capability bit.
    #[error("server handshake flags {flags:#x} lack the fixed-newstyle bit")]
    MissingFixedNewstyle {
        /// The raw 16-bit handshake flags advertised by the server.
        flags: u16,
    },
    /// An option reply echoed a different option than was requested.
    #[error("option reply echoed option {actual} (expected {expected})")]
    UnexpectedOption {
        /// The option the client sent.
        expected: OptionCode,
        /// The raw option id echoed by the server.
        actual: u32,
    },
    /// The server answered an option with an error-flagged reply type.
    #[error("server rejected option {option} with reply type {reply_type:#x}")]
    OptionRejected {
        /// The rejected option.
        option: OptionCode,
        /// The raw error-flagged reply type.
        reply_type: u32,
    },
    /// An option reply carried an unexpected non-error reply type.
    #[error("option {option} got unexpected reply type {reply_type:#x}")]
    UnexpectedReplyType {
        /// The option the client sent.
        option: OptionCode,
        /// The raw reply type received.
        reply_type: u32,
    },
    /// An option reply declared a payload where none is allowed.
    #[error("option {option} reply declared a bogus {length}-byte payload")]
    UnexpectedReplyLength {
        /// The option the client sent.
        option: OptionCode,
        /// The declared payload length.
        length: u32,
    },
    /// A command reply echoed a handle other than the one in flight.
    #[error("command reply echoed handle {actual:#x} (expected {expected:#x})")]
    HandleMismatch {
        /// The handle of the in-flight command.
        expected: u64,
        /// The handle echoed by the server.
        actual: u64,
    },
}

impl ProtocolError {
    /// Returns the error code of a rejected option with the error bit
    /// stripped, if this value describes an option rejection.
    #[must_use]
    pub const fn rejected_reply_code(&self) -> Option<u32> {
        match self {
            Self::OptionRejected { reply_type, .. } => {
                Some(*reply_type & !OPTION_REPLY_FLAG_ERROR)
            }
            _ => None,
        }
    }

    /// Returns the violated magic field, if this value describes a
    /// magic mismatch.
    #[must_use]
    pub const fn bad_magic_field(&self) -> Option<MagicField> {
        match self {
            Self::BadMagic { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl From<ProtocolError> for io::Error {
    fn from(err: ProtocolError) -> Self {
        Self::new(io::ErrorKind::InvalidData, err)
    }
}

/// Failure while decoding a fixed structure from the stream.
///
/// Transport failures and contract violations propagate separately so
/// callers can preserve the distinction mandated by the session error
/// taxonomy.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The underlying stream failed or ended short of the structure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A decoded field violated the protocol contract.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io(err) => err,
            DecodeError::Protocol(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_magic_reports_field_and_values() {
        let err = ProtocolError::BadMagic {
            field: MagicField::Protocol,
            actual: 0xdead,
        };
        assert_eq!(err.bad_magic_field(), Some(MagicField::Protocol));
        let message = err.to_string();
        assert!(message.contains("protocol magic"), "{message}");
        assert!(message.contains("0xdead"), "{message}");
        assert!(message.contains("0x4e42444d41474943"), "{message}");
    }

    #[test]
    fn rejected_reply_code_strips_the_error_bit() {
        let err = ProtocolError::OptionRejected {
            option: OptionCode::StartTls,
            reply_type: crate::constants::OPTION_REPLY_ERR_POLICY,
        };
        assert_eq!(err.rejected_reply_code(), Some(2));
    }

    #[test]
    fn decode_error_collapses_into_io_error() {
        let err = DecodeError::Protocol(ProtocolError::MissingFixedNewstyle { flags: 0 });
        let io_err = io::Error::from(err);
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }
}
