//! Fixed constants of the NBD fixed-newstyle protocol.
//!
//! The numeric values mirror the reference protocol description
//! (`proto.md` in the upstream NBD repository) so interoperability
//! failures can be diagnosed against the published tables. All
//! multi-byte fields built from these constants travel big-endian on
//! the wire.

/// Magic opening a newstyle server greeting (ASCII `NBDMAGIC`).
pub const NBD_MAGIC: u64 = 0x4e42444d41474943;

/// Magic following [`NBD_MAGIC`] in the greeting and opening every
/// client option request (ASCII `IHAVEOPT`).
pub const OPTS_MAGIC: u64 = 0x49484156454F5054;

/// Magic opening every server option reply envelope.
pub const OPTION_REPLY_MAGIC: u64 = 0x3e889045565a9;

/// Magic opening every transmission-phase command request.
pub const REQUEST_MAGIC: u32 = 0x25609513;

/// Magic opening every simple command reply.
pub const SIMPLE_REPLY_MAGIC: u32 = 0x67446698;

/// Default TCP port served by NBD daemons.
pub const DEFAULT_PORT: u16 = 10809;

/// Length of the reserved region trailing the export-details reply.
///
/// The region is defined as zero padding unless `NO_ZEROES` was
/// negotiated. This client never requests `NO_ZEROES`, so the full
/// 124 bytes are always present and always discarded unread.
pub const EXPORT_PADDING_LEN: usize = 124;

/// Handshake flag: the server speaks fixed-newstyle negotiation.
pub const HANDSHAKE_FLAG_FIXED_NEWSTYLE: u16 = 1 << 0;
/// Handshake flag: the server can omit the export-details padding.
pub const HANDSHAKE_FLAG_NO_ZEROES: u16 = 1 << 1;

/// Client flag echoing [`HANDSHAKE_FLAG_FIXED_NEWSTYLE`].
pub const CLIENT_FLAG_FIXED_NEWSTYLE: u32 = 1 << 0;
/// Client flag requesting omission of the export-details padding.
pub const CLIENT_FLAG_NO_ZEROES: u32 = 1 << 1;

/// Command flag: force unit access (write through to stable storage).
pub const CMD_FLAG_FUA: u16 = 1 << 0;
/// Command flag: the server may trim instead of writing zeroes.
pub const CMD_FLAG_MAY_TRIM: u16 = 1 << 1;
/// Command flag: do not fragment a structured reply.
pub const CMD_FLAG_DF: u16 = 1 << 2;

/// Bit flagging an option reply type as an error.
pub const OPTION_REPLY_FLAG_ERROR: u32 = 1 << 31;

/// Option reply type: request acknowledged.
pub const OPTION_REPLY_ACK: u32 = 1;
/// Option reply type: export listing entry.
pub const OPTION_REPLY_SERVER: u32 = 2;
/// Option reply type: information block.
pub const OPTION_REPLY_INFO: u32 = 3;

/// Option error reply: option unsupported by the server.
pub const OPTION_REPLY_ERR_UNSUP: u32 = 1 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: refused by server policy.
pub const OPTION_REPLY_ERR_POLICY: u32 = 2 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: request was syntactically invalid.
pub const OPTION_REPLY_ERR_INVALID: u32 = 3 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: unsupported on this platform.
pub const OPTION_REPLY_ERR_PLATFORM: u32 = 4 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: TLS must be negotiated first.
pub const OPTION_REPLY_ERR_TLS_REQD: u32 = 5 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: requested export is unknown.
pub const OPTION_REPLY_ERR_UNKNOWN: u32 = 6 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: server is shutting down.
pub const OPTION_REPLY_ERR_SHUTDOWN: u32 = 7 | OPTION_REPLY_FLAG_ERROR;
/// Option error reply: block-size negotiation is required.
pub const OPTION_REPLY_ERR_BLOCK_SIZE_REQD: u32 = 8 | OPTION_REPLY_FLAG_ERROR;
