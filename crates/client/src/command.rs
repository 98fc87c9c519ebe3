//! Transmission-phase command exchanges.

use std::io::{Read, Write};

use nbd_protocol::{CommandReply, CommandRequest, CommandType};
use tracing::trace;

use crate::error::{ClientError, Step};

/// Exchanges one read command and returns the payload verbatim.
///
/// The reply's error code is inspected before any payload read: a
/// non-zero code is an authoritative server error, not a short read
/// waiting to happen. The echoed handle must match `handle`.
pub(crate) fn read_block<S>(
    stream: &mut S,
    handle: u64,
    offset: u64,
    length: u32,
) -> Result<Vec<u8>, ClientError>
where
    S: Read + Write,
{
    trace!(handle, offset, length, "sending read command");
    CommandRequest::read(handle, offset, length)
        .write_to(stream)
        .and_then(|()| stream.flush())
        .map_err(|err| ClientError::transport(Step::Command, err))?;

    let reply = CommandReply::read_from(stream)
        .map_err(|err| ClientError::from_decode(Step::Command, err))?;
    reply.ensure_handle(handle)?;

    if let Some(kind) = reply.server_error() {
        return Err(ClientError::Server {
            command: CommandType::Read,
            code: reply.error_code(),
            kind,
        });
    }

    let mut payload = vec![0u8; length as usize];
    stream
        .read_exact(&mut payload)
        .map_err(|err| ClientError::transport(Step::Command, err))?;
    Ok(payload)
}

/// Sends the graceful disconnect command. `DISC` has no reply.
pub(crate) fn send_disconnect<S>(stream: &mut S) -> Result<(), ClientError>
where
    S: Write,
{
    trace!("sending disconnect command");
    CommandRequest::disconnect()
        .write_to(stream)
        .and_then(|()| stream.flush())
        .map_err(|err| ClientError::transport(Step::Close, err))
}
