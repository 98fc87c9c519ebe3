//! Negotiation-phase option envelopes.
//!
//! After the opening handshake the client drives negotiation by
//! sending option requests; the server answers selected options with
//! reply envelopes. Both envelopes are fixed-layout big-endian
//! structures. `EXPORT_NAME` is the one option the server answers with
//! export details instead of a reply envelope.

use std::fmt;
use std::io::{self, Read, Write};

use crate::constants::{OPTION_REPLY_ACK, OPTION_REPLY_FLAG_ERROR, OPTION_REPLY_MAGIC, OPTS_MAGIC};
use crate::error::{DecodeError, MagicField, ProtocolError};
use crate::io::{read_u32, read_u64, write_u32, write_u64};

/// Options a fixed-newstyle client may request during negotiation.
///
/// The numeric values mirror the upstream `NBD_OPT_*` table. This
/// client issues only [`OptionCode::StartTls`] and
/// [`OptionCode::ExportName`]; the remaining variants exist so
/// diagnostics and future extensions can name every assigned code.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
pub enum OptionCode {
    /// Select a named export and enter the transmission phase.
    #[doc(alias = "NBD_OPT_EXPORT_NAME")]
    ExportName = 1,
    /// Abort the negotiation.
    #[doc(alias = "NBD_OPT_ABORT")]
    Abort = 2,
    /// List the exports the server offers.
    #[doc(alias = "NBD_OPT_LIST")]
    List = 3,
    /// Query an export without selecting it (withdrawn upstream).
    #[doc(alias = "NBD_OPT_PEEK_EXPORT")]
    PeekExport = 4,
    /// Upgrade the connection to TLS in band.
    #[doc(alias = "NBD_OPT_STARTTLS")]
    StartTls = 5,
    /// Request details about an export.
    #[doc(alias = "NBD_OPT_INFO")]
    Info = 6,
    /// Select an export with structured error reporting.
    #[doc(alias = "NBD_OPT_GO")]
    Go = 7,
    /// Enable structured replies for the transmission phase.
    #[doc(alias = "NBD_OPT_STRUCTURED_REPLY")]
    StructuredReply = 8,
}

impl OptionCode {
    /// Returns the wire representation of the option id.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    const fn name(self) -> &'static str {
        match self {
            Self::ExportName => "EXPORT_NAME",
            Self::Abort => "ABORT",
            Self::List => "LIST",
            Self::PeekExport => "PEEK_EXPORT",
            Self::StartTls => "STARTTLS",
            Self::Info => "INFO",
            Self::Go => "GO",
            Self::StructuredReply => "STRUCTURED_REPLY",
        }
    }
}

impl fmt::Display for OptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A client option request: `IHAVEOPT`, option id, payload length,
/// then the raw payload bytes with no terminator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptionRequest<'a> {
    option: OptionCode,
    payload: &'a [u8],
}

impl<'a> OptionRequest<'a> {
    /// Creates a request for `option` carrying `payload` verbatim.
    #[must_use]
    pub const fn new(option: OptionCode, payload: &'a [u8]) -> Self {
        Self { option, payload }
    }

    /// Returns the requested option.
    #[must_use]
    pub const fn option(&self) -> OptionCode {
        self.option
    }

    /// Writes the envelope followed by the payload bytes.
    ///
    /// The payload length field is the exact byte length of the
    /// payload; the protocol caps it at `u32`, which no caller in this
    /// workspace approaches.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u64(writer, OPTS_MAGIC)?;
        write_u32(writer, self.option.as_u32())?;
        write_u32(writer, self.payload.len() as u32)?;
        writer.write_all(self.payload)
    }
}

/// A server option reply envelope: reply magic, echoed option id,
/// reply type, payload length.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OptionReply {
    option: u32,
    reply_type: u32,
    payload_len: u32,
}

impl OptionReply {
    /// Reads a reply envelope, failing on a bad reply magic.
    ///
    /// The payload (if any) is left on the stream for the caller.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let magic = read_u64(reader)?;
        if magic != OPTION_REPLY_MAGIC {
            return Err(ProtocolError::BadMagic {
                field: MagicField::OptionReply,
                actual: magic,
            }
            .into());
        }

        let option = read_u32(reader)?;
        let reply_type = read_u32(reader)?;
        let payload_len = read_u32(reader)?;
        Ok(Self {
            option,
            reply_type,
            payload_len,
        })
    }

    /// Returns the raw echoed option id.
    #[must_use]
    pub const fn option(self) -> u32 {
        self.option
    }

    /// Returns the raw reply type.
    #[must_use]
    pub const fn reply_type(self) -> u32 {
        self.reply_type
    }

    /// Returns the declared payload length.
    #[must_use]
    pub const fn payload_len(self) -> u32 {
        self.payload_len
    }

    /// Reports whether the reply type carries the error bit.
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.reply_type & OPTION_REPLY_FLAG_ERROR != 0
    }

    /// Validates the reply as a bare acknowledgment of `option`.
    ///
    /// An error-flagged reply type surfaces as
    /// [`ProtocolError::OptionRejected`], distinct from the mismatch
    /// errors raised for a wrong echo, a non-ACK type, or a non-empty
    /// payload declaration.
    pub fn ensure_ack(self, option: OptionCode) -> Result<(), ProtocolError> {
        if self.option != option.as_u32() {
            return Err(ProtocolError::UnexpectedOption {
                expected: option,
                actual: self.option,
            });
        }
        if self.is_error() {
            return Err(ProtocolError::OptionRejected {
                option,
                reply_type: self.reply_type,
            });
        }
        if self.reply_type != OPTION_REPLY_ACK {
            return Err(ProtocolError::UnexpectedReplyType {
                option,
                reply_type: self.reply_type,
            });
        }
        if self.payload_len != 0 {
            return Err(ProtocolError::UnexpectedReplyLength {
                option,
                length: self.payload_len,
            });
        }
        Ok(())
    }
}
