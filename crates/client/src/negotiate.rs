//! Export selection over an upgraded connection.

use std::io::{Read, Write};

use nbd_protocol::{ExportDetails, OptionCode, OptionRequest};
use tracing::debug;

use crate::error::{ClientError, Step};

/// Requests `name` with `EXPORT_NAME` and reads the export details.
///
/// The name travels verbatim with no terminator; its byte length is
/// the payload length. This protocol variant gives the server no way
/// to acknowledge a bad name explicitly, so an unknown export
/// typically surfaces here as a transport error when the server hangs
/// up instead of sending details.
pub(crate) fn negotiate_export<S>(stream: &mut S, name: &[u8]) -> Result<ExportDetails, ClientError>
where
    S: Read + Write,
{
    OptionRequest::new(OptionCode::ExportName, name)
        .write_to(stream)
        .and_then(|()| stream.flush())
        .map_err(|err| ClientError::transport(Step::ExportNegotiation, err))?;

    let details = ExportDetails::read_from(stream)
        .map_err(|err| ClientError::from_decode(Step::ExportNegotiation, err))?;

    debug!(
        size = details.size(),
        flags = details.flags().bits(),
        "export negotiated"
    );
    Ok(details)
}
