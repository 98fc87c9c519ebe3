//! Export-details reply sent after `EXPORT_NAME`.
//!
//! Selecting an export with `EXPORT_NAME` skips the reply envelope:
//! the server answers directly with the export size, 16 bits of
//! transmission flags, and [`EXPORT_PADDING_LEN`] reserved bytes that
//! this client reads and discards without interpretation.

use std::io::Read;

use crate::constants::EXPORT_PADDING_LEN;
use crate::error::DecodeError;
use crate::io::{read_u16, read_u64};

/// Capability bits describing an export during the transmission phase.
///
/// The values mirror the upstream `NBD_FLAG_*` transmission table.
/// This client stores them as metadata only; it never issues the
/// commands most of them gate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransmissionFlags(u16);

impl TransmissionFlags {
    const HAS_FLAGS: u16 = 1 << 0;
    const READ_ONLY: u16 = 1 << 1;
    const SEND_FLUSH: u16 = 1 << 2;
    const SEND_FUA: u16 = 1 << 3;
    const ROTATIONAL: u16 = 1 << 4;
    const SEND_TRIM: u16 = 1 << 5;
    const SEND_WRITE_ZEROES: u16 = 1 << 6;
    const SEND_DF: u16 = 1 << 7;
    const SEND_CLOSE: u16 = 1 << 8;

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

    /// Reports whether the flag word is meaningful at all.
    #[must_use]
    pub const fn has_flags(self) -> bool {
        self.0 & Self::HAS_FLAGS != 0
    }

    /// Reports whether the export rejects writes.
    #[must_use]
    pub const fn read_only(self) -> bool {
        self.0 & Self::READ_ONLY != 0
    }

    /// Reports whether the export accepts `FLUSH`.
    #[must_use]
    pub const fn send_flush(self) -> bool {
        self.0 & Self::SEND_FLUSH != 0
    }

    /// Reports whether the export accepts the FUA command flag.
    #[must_use]
    pub const fn send_fua(self) -> bool {
        self.0 & Self::SEND_FUA != 0
    }

    /// Reports whether the export is backed by rotational media.
    #[must_use]
    pub const fn rotational(self) -> bool {
        self.0 & Self::ROTATIONAL != 0
    }

    /// Reports whether the export accepts `TRIM`.
    #[must_use]
    pub const fn send_trim(self) -> bool {
        self.0 & Self::SEND_TRIM != 0
    }

    /// Reports whether the export accepts `WRITE_ZEROES`.
    #[must_use]
    pub const fn send_write_zeroes(self) -> bool {
        self.0 & Self::SEND_WRITE_ZEROES != 0
    }

    /// Reports whether the export honors the do-not-fragment flag.
    #[must_use]
    pub const fn send_df(self) -> bool {
        self.0 & Self::SEND_DF != 0
    }

    /// Reports whether the export accepts `CLOSE`.
    #[must_use]
    pub const fn send_close(self) -> bool {
        self.0 & Self::SEND_CLOSE != 0
    }
}

/// The export-details reply: size, transmission flags, padding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExportDetails {
    size: u64,
    flags: TransmissionFlags,
}

impl ExportDetails {
    /// Reads the details and consumes the trailing reserved region.
    ///
    /// The full [`EXPORT_PADDING_LEN`] bytes are always read; this
    /// client never negotiates the shortened no-zeroes variant. A
    /// short region fails the whole structure.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let size = read_u64(reader)?;
        let flags = TransmissionFlags::from_bits(read_u16(reader)?);

        let mut padding = [0u8; EXPORT_PADDING_LEN];
        reader.read_exact(&mut padding)?;

        Ok(Self { size, flags })
    }

    /// Returns the export size in bytes.
    #[must_use]
    pub const fn size(self) -> u64 {
        self.size
    }

    /// Returns the export's transmission flags.
    #[must_use]
    pub const fn flags(self) -> TransmissionFlags {
        self.flags
    }
}
