//! Opening handshake structures.
//!
//! A fixed-newstyle server opens the conversation with an 18-byte
//! greeting: `NBDMAGIC`, `IHAVEOPT`, then 16 bits of handshake flags.
//! The client answers with 32 bits of client flags and negotiation
//! begins.

use std::io::{self, Read, Write};

use crate::constants::{
    CLIENT_FLAG_FIXED_NEWSTYLE, CLIENT_FLAG_NO_ZEROES, HANDSHAKE_FLAG_FIXED_NEWSTYLE,
    HANDSHAKE_FLAG_NO_ZEROES, NBD_MAGIC, OPTS_MAGIC,
};
use crate::error::{DecodeError, MagicField, ProtocolError};
use crate::io::{read_u16, read_u64, write_u32};

/// The 16-bit capability bitfield a server advertises in its greeting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HandshakeFlags(u16);

impl HandshakeFlags {
    /// Wraps a raw flag word read off the wire.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw flag word.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Reports whether the server speaks fixed-newstyle negotiation.
    #[must_use]
    pub const fn fixed_newstyle(self) -> bool {
        self.0 & HANDSHAKE_FLAG_FIXED_NEWSTYLE != 0
    }

    /// Reports whether the server can omit the export-details padding.
    #[must_use]
    pub const fn no_zeroes(self) -> bool {
        self.0 & HANDSHAKE_FLAG_NO_ZEROES != 0
    }
}

/// The server's opening greeting: both magics plus handshake flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerGreeting {
    flags: HandshakeFlags,
}

impl ServerGreeting {
    /// Reads and validates the greeting.
    ///
    /// Each magic is checked as soon as it is read, so a mismatch in
    /// the protocol magic fails before the options magic is consumed
    /// and nothing is written in response.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let magic = read_u64(reader)?;
        if magic != NBD_MAGIC {
            return Err(ProtocolError::BadMagic {
                field: MagicField::Protocol,
                actual: magic,
            }
            .into());
        }

        let opts_magic = read_u64(reader)?;
        if opts_magic != OPTS_MAGIC {
            return Err(ProtocolError::BadMagic {
                field: MagicField::Options,
                actual: opts_magic,
            }
            .into());
        }

        let flags = HandshakeFlags::from_bits(read_u16(reader)?);
        Ok(Self { flags })
    }

    /// Returns the advertised handshake flags.
    #[must_use]
    pub const fn flags(self) -> HandshakeFlags {
        self.flags
    }
}

/// The 32-bit flag word the client sends in answer to the greeting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientFlags(u32);

impl ClientFlags {
    /// Flags for a fixed-newstyle client that keeps the zero padding.
    pub const FIXED_NEWSTYLE: Self = Self(CLIENT_FLAG_FIXED_NEWSTYLE);

    /// Returns the raw flag word.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reports whether the no-zeroes bit is set.
    #[must_use]
    pub const fn no_zeroes(self) -> bool {
        self.0 & CLIENT_FLAG_NO_ZEROES != 0
    }

    /// Writes the flag word.
    pub fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        write_u32(writer, self.0)
    }
}
