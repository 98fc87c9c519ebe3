#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Wire codec for the NBD fixed-newstyle protocol.
//!
//! The crate defines every fixed-layout structure a fixed-newstyle
//! client exchanges with a server — the opening greeting, the option
//! request/reply envelopes, the export-details reply, and the
//! transmission-phase command request/reply — together with the magic,
//! flag, option, and error constant tables. All multi-byte fields are
//! big-endian on the wire.
//!
//! # Design
//!
//! Each structure decodes from and encodes to plain [`std::io::Read`]
//! and [`std::io::Write`] streams, consuming exactly its declared
//! width. A short read or a constant-field mismatch fails the whole
//! structure; nothing here attempts to resynchronize a desynchronized
//! stream. The crate sits at the bottom of the workspace and depends
//! on no other member.
//!
//! # Examples
//!
//! Frame the option request that selects an export:
//!
//! ```
//! use nbd_protocol::{OptionCode, OptionRequest};
//!
//! let mut framed = Vec::new();
//! OptionRequest::new(OptionCode::ExportName, b"test")
//!     .write_to(&mut framed)
//!     .expect("writing to a Vec cannot fail");
//!
//! // IHAVEOPT + option id + payload length + the name, verbatim.
//! assert_eq!(framed.len(), 8 + 4 + 4 + 4);
//! assert!(framed.ends_with(b"test"));
//! ```

mod command;
mod constants;
mod error;
mod export;
mod handshake;
mod io;
mod option;

pub use command::{CommandReply, CommandRequest, CommandType, ServerErrorKind};
pub use constants::{
    CLIENT_FLAG_FIXED_NEWSTYLE, CLIENT_FLAG_NO_ZEROES, CMD_FLAG_DF, CMD_FLAG_FUA,
    CMD_FLAG_MAY_TRIM, DEFAULT_PORT, EXPORT_PADDING_LEN, HANDSHAKE_FLAG_FIXED_NEWSTYLE,
    HANDSHAKE_FLAG_NO_ZEROES, NBD_MAGIC, OPTION_REPLY_ACK, OPTION_REPLY_ERR_BLOCK_SIZE_REQD,
    OPTION_REPLY_ERR_INVALID, OPTION_REPLY_ERR_PLATFORM, OPTION_REPLY_ERR_POLICY,
    OPTION_REPLY_ERR_SHUTDOWN, OPTION_REPLY_ERR_TLS_REQD, OPTION_REPLY_ERR_UNKNOWN,
    OPTION_REPLY_ERR_UNSUP, OPTION_REPLY_FLAG_ERROR, OPTION_REPLY_INFO, OPTION_REPLY_MAGIC,
    OPTION_REPLY_SERVER, OPTS_MAGIC, REQUEST_MAGIC, SIMPLE_REPLY_MAGIC,
};
pub use error::{DecodeError, MagicField, ProtocolError};
pub use export::{ExportDetails, TransmissionFlags};
pub use handshake::{ClientFlags, HandshakeFlags, ServerGreeting};
pub use option::{OptionCode, OptionReply, OptionRequest};
