//! The opening handshake and the STARTTLS sub-protocol.
//!
//! The engine walks a strict sequence: validate both greeting magics,
//! require the fixed-newstyle capability, answer with the client flag
//! word, then immediately request the TLS upgrade. There is no
//! supported path that stays on the plain channel; a rejected
//! STARTTLS is fatal to session construction.

use std::io::{Read, Write};

use nbd_protocol::{
    ClientFlags, HandshakeFlags, OptionCode, OptionReply, OptionRequest, ProtocolError,
    ServerGreeting,
};
use tracing::debug;

use crate::error::{ClientError, Step};

/// Performs the fixed-newstyle opening exchange.
///
/// Reads and validates the greeting, then sends the client flag word.
/// On a magic or capability mismatch the function fails before
/// writing anything, so no bytes beyond the failing step ever reach
/// the server.
pub(crate) fn negotiate_fixed_newstyle<S>(stream: &mut S) -> Result<HandshakeFlags, ClientError>
where
    S: Read + Write,
{
    let greeting = ServerGreeting::read_from(stream)
        .map_err(|err| ClientError::from_decode(Step::Handshake, err))?;

    let flags = greeting.flags();
    if !flags.fixed_newstyle() {
        return Err(ProtocolError::MissingFixedNewstyle {
            flags: flags.bits(),
        }
        .into());
    }

    ClientFlags::FIXED_NEWSTYLE
        .write_to(stream)
        .and_then(|()| stream.flush())
        .map_err(|err| ClientError::transport(Step::Handshake, err))?;

    debug!(server_flags = flags.bits(), "fixed-newstyle handshake complete");
    Ok(flags)
}

/// Requests the in-band TLS upgrade and validates the acknowledgment.
///
/// The caller performs the actual TLS handshake once this returns; an
/// error-flagged reply type surfaces as an option rejection, distinct
/// from a malformed envelope.
pub(crate) fn request_starttls<S>(stream: &mut S) -> Result<(), ClientError>
where
    S: Read + Write,
{
    OptionRequest::new(OptionCode::StartTls, &[])
        .write_to(stream)
        .and_then(|()| stream.flush())
        .map_err(|err| ClientError::transport(Step::TlsUpgrade, err))?;

    let reply = OptionReply::read_from(stream)
        .map_err(|err| ClientError::from_decode(Step::TlsUpgrade, err))?;
    reply.ensure_ack(OptionCode::StartTls)?;

    debug!("server acknowledged STARTTLS");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryTransport;
    use nbd_protocol::{
        HANDSHAKE_FLAG_FIXED_NEWSTYLE, HANDSHAKE_FLAG_NO_ZEROES, MagicField, NBD_MAGIC,
        OPTION_REPLY_ACK, OPTION_REPLY_ERR_TLS_REQD, OPTION_REPLY_MAGIC, OPTS_MAGIC,
    };

    fn greeting(flags: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&NBD_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&OPTS_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&flags.to_be_bytes());
        bytes
    }

    fn starttls_reply(reply_type: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&OPTION_REPLY_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&OptionCode::StartTls.as_u32().to_be_bytes());
        bytes.extend_from_slice(&reply_type.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes
    }

    #[test]
    fn valid_greeting_elicits_the_client_flag_word() {
        let mut transport = MemoryTransport::new(&greeting(HANDSHAKE_FLAG_FIXED_NEWSTYLE));
        let flags = negotiate_fixed_newstyle(&mut transport).expect("handshake succeeds");
        assert!(flags.fixed_newstyle());
        assert_eq!(transport.writes(), [0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn extra_handshake_bits_are_tolerated() {
        let mut transport = MemoryTransport::new(&greeting(
            HANDSHAKE_FLAG_FIXED_NEWSTYLE | HANDSHAKE_FLAG_NO_ZEROES,
        ));
        let flags = negotiate_fixed_newstyle(&mut transport).expect("handshake succeeds");
        assert!(flags.no_zeroes());
    }

    #[test]
    fn mutated_magic_fails_without_writing_anything() {
        let mut bytes = greeting(HANDSHAKE_FLAG_FIXED_NEWSTYLE);
        bytes[5] ^= 0x01;
        let mut transport = MemoryTransport::new(&bytes);
        let err = negotiate_fixed_newstyle(&mut transport).expect_err("bad magic");
        match err {
            ClientError::Protocol(err) => {
                assert_eq!(err.bad_magic_field(), Some(MagicField::Protocol));
            }
            other => panic!("expected protocol mismatch, got {other}"),
        }
        assert!(
            transport.writes().is_empty(),
            "nothing may be sent after a failed greeting"
        );
    }

    #[test]
    fn missing_fixed_newstyle_bit_is_fatal() {
        let mut transport = MemoryTransport::new(&greeting(HANDSHAKE_FLAG_NO_ZEROES));
        let err = negotiate_fixed_newstyle(&mut transport).expect_err("capability missing");
        assert!(matches!(
            err,
            ClientError::Protocol(ProtocolError::MissingFixedNewstyle { flags: 0x2 })
        ));
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn starttls_acknowledgment_passes() {
        let mut transport = MemoryTransport::new(&starttls_reply(OPTION_REPLY_ACK));
        request_starttls(&mut transport).expect("STARTTLS accepted");
        // IHAVEOPT + STARTTLS id + zero payload length.
        assert_eq!(transport.writes().len(), 16);
        assert_eq!(&transport.writes()[8..12], &5u32.to_be_bytes());
    }

    #[test]
    fn error_flagged_starttls_reply_is_a_rejection() {
        let mut transport = MemoryTransport::new(&starttls_reply(OPTION_REPLY_ERR_TLS_REQD));
        let err = request_starttls(&mut transport).expect_err("rejection surfaces");
        assert!(err.is_option_rejected());
    }
}
