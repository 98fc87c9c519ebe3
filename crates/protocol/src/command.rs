//! Transmission-phase command request and reply structures.
//!
//! After export negotiation the client issues commands framed as a
//! 28-byte request; the server answers each data command with a
//! 16-byte simple reply followed by the payload (for reads). The
//! reply's error code is authoritative: a non-zero code means no
//! payload follows.

use std::fmt;
use std::io::{self, Read, Write};

use crate::constants::{REQUEST_MAGIC, SIMPLE_REPLY_MAGIC};
use crate::error::{DecodeError, MagicField, ProtocolError};
use crate::io::{read_u32, read_u64, write_u16, write_u32, write_u64};

/// Commands defined for the transmission phase.
///
/// Only [`CommandType::Read`] and [`CommandType::Disconnect`] are
/// issued by this client; the remaining variants name the assigned
/// codes for diagnostics and future extension.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u16)]
pub enum CommandType {
    /// Read `length` bytes at `offset`.
    #[doc(alias = "NBD_CMD_READ")]
    Read = 0,
    /// Write `length` bytes at `offset`.
    #[doc(alias = "NBD_CMD_WRITE")]
    Write = 1,
    /// Disconnect gracefully; the server sends no reply.
    #[doc(alias = "NBD_CMD_DISC")]
    Disconnect = 2,
    /// Flush prior writes to stable storage.
    #[doc(alias = "NBD_CMD_FLUSH")]
    Flush = 3,
    /// Discard a range.
    #[doc(alias = "NBD_CMD_TRIM")]
    Trim = 4,
    /// Write a run of zeroes without transferring them.
    #[doc(alias = "NBD_CMD_WRITE_ZEROES")]
    WriteZeroes = 5,
    /// Close the export (extension command).
    #[doc(alias = "NBD_CMD_CLOSE")]
    Close = 7,
}

impl CommandType {
    /// Returns the wire representation of the command type.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Disconnect => "DISC",
            Self::Flush => "FLUSH",
            Self::Trim => "TRIM",
            Self::WriteZeroes => "WRITE_ZEROES",
            Self::Close => "CLOSE",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classified server error codes carried in command replies.
///
/// The numeric values are the errno-style constants the protocol
/// assigns; anything else is preserved raw in
/// [`ServerErrorKind::Other`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ServerErrorKind {
    /// Operation not permitted (1).
    Permission,
    /// Input/output error (5).
    Io,
    /// Server out of memory (12).
    NoMemory,
    /// Invalid argument (22).
    InvalidArgument,
    /// No space left on device (28).
    NoSpace,
    /// Value too large for the defined data type (75).
    Overflow,
    /// A code outside the assigned table.
    Other(u32),
}

impl ServerErrorKind {
    /// Classifies a raw non-zero error code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Permission,
            5 => Self::Io,
            12 => Self::NoMemory,
            22 => Self::InvalidArgument,
            28 => Self::NoSpace,
            75 => Self::Overflow,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for ServerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission => f.write_str("operation not permitted"),
            Self::Io => f.write_str("input/output error"),
            Self::NoMemory => f.write_str("out of memory"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::NoSpace => f.write_str("no space left on device"),
            Self::Overflow => f.write_str("value too large"),
            Self::Other(code) => write!(f, "unrecognized error code {code}"),
        }
    }
}

/// A transmission-phase command request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommandRequest {
    flags: u16,
    command: CommandType,
    handle: u64,
    offset: u64,
    length: u32,
}

impl CommandRequest {
    /// Builds a read request for `length` bytes at `offset`.
    #[must_use]
    pub const fn read(handle: u64, offset: u64, length: u32) -> Self {
        Self {
            flags: 0,
            command: CommandType::Read,
            handle,
            offset,
            length,
        }
    }

    /// Builds the graceful disconnect request.
    ///
    /// `DISC` has no reply to correlate, so it carries a zero handle
    /// alongside its zero offset and length.
    #[must_use]
    pub const fn disconnect() -> Self {
        Self {
            flags: 0,
            command: CommandType::Disconnect,
            handle: 0,
            offset: 0,
            length: 0,
        }
    }

    /// Returns the command type.
    #[must_use]
    pub const fn command(self) -> CommandType {
        self.command
    }

    /// Returns the correlation handle.
    #[must_use]
    pub const fn handle(self) -> u64 {
        self.handle
    }

    /// Writes the 28-byte request structure.
    pub fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        write_u32(writer, REQUEST_MAGIC)?;
        write_u16(writer, self.flags)?;
        write_u16(writer, self.command.as_u16())?;
        write_u64(writer, self.handle)?;
        write_u64(writer, self.offset)?;
        write_u32(writer, self.length)
    }
}

/// A simple command reply header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommandReply {
    error: u32,
    handle: u64,
}

impl CommandReply {
    /// Reads a reply header, failing on a bad reply magic.
    ///
    /// Any payload is left on the stream; callers must inspect
    /// [`CommandReply::server_error`] before reading it.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let magic = read_u32(reader)?;
        if magic != SIMPLE_REPLY_MAGIC {
            return Err(ProtocolError::BadMagic {
                field: MagicField::CommandReply,
                actual: u64::from(magic),
            }
            .into());
        }

        let error = read_u32(reader)?;
        let handle = read_u64(reader)?;
        Ok(Self { error, handle })
    }

    /// Returns the raw error code.
    #[must_use]
    pub const fn error_code(self) -> u32 {
        self.error
    }

    /// Returns the echoed correlation handle.
    #[must_use]
    pub const fn handle(self) -> u64 {
        self.handle
    }

    /// Classifies a non-zero error code, or `None` on success.
    #[must_use]
    pub const fn server_error(self) -> Option<ServerErrorKind> {
        if self.error == 0 {
            None
        } else {
            Some(ServerErrorKind::from_code(self.error))
        }
    }

    /// Validates that the reply echoes the in-flight handle.
    pub const fn ensure_handle(self, expected: u64) -> Result<(), ProtocolError> {
        if self.handle == expected {
            Ok(())
        } else {
            Err(ProtocolError::HandleMismatch {
                expected,
                actual: self.handle,
            })
        }
    }
}
