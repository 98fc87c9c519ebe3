//! Client TLS configuration for the in-band STARTTLS upgrade.
//!
//! Peer verification is a caller decision, not a hardcoded default:
//! [`TlsParameters`] verifies the server certificate against the
//! webpki trust anchors unless the caller explicitly opts out with
//! [`TlsParameters::danger_disable_peer_verification`]. The opt-out
//! path installs a verifier that accepts any certificate while still
//! delegating signature checks to the crypto provider.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, ring};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, InvalidDnsNameError, ServerName, UnixTime};

/// TLS settings applied when the session upgrades its transport.
#[derive(Clone, Debug)]
pub struct TlsParameters {
    server_name: ServerName<'static>,
    verify_peer: bool,
}

impl TlsParameters {
    /// Creates parameters targeting `server_name`, with peer
    /// verification enabled.
    ///
    /// `server_name` is the DNS name or IP literal presented for SNI
    /// and certificate matching, typically the host portion of the
    /// dialed address.
    pub fn new(server_name: &str) -> Result<Self, InvalidDnsNameError> {
        Ok(Self {
            server_name: ServerName::try_from(server_name)?.to_owned(),
            verify_peer: true,
        })
    }

    /// Disables verification of the server certificate.
    ///
    /// The channel is still encrypted, but the peer is no longer
    /// authenticated; an active attacker can impersonate the server.
    #[must_use]
    pub fn danger_disable_peer_verification(mut self) -> Self {
        self.verify_peer = false;
        self
    }

    /// Reports whether the server certificate will be verified.
    #[must_use]
    pub const fn verify_peer(&self) -> bool {
        self.verify_peer
    }

    /// Returns the name presented for SNI and certificate matching.
    #[must_use]
    pub const fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }

    /// Builds the rustls client configuration these parameters describe.
    pub fn client_config(&self) -> Result<ClientConfig, rustls::Error> {
        let provider = Arc::new(ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let config = if self.verify_peer {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots).with_no_client_auth()
        } else {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
                .with_no_client_auth()
        };

        Ok(config)
    }
}

/// Verifier that accepts any server certificate.
///
/// Installed only when the caller opted out of verification.
/// Handshake signature checks still go through the provider so a
/// garbled handshake fails even on this path.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    const fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_is_on_by_default() {
        let params = TlsParameters::new("localhost").expect("valid name");
        assert!(params.verify_peer());
        assert!(params.client_config().is_ok());
    }

    #[test]
    fn opting_out_builds_the_dangerous_config() {
        let params = TlsParameters::new("localhost")
            .expect("valid name")
            .danger_disable_peer_verification();
        assert!(!params.verify_peer());
        assert!(params.client_config().is_ok());
    }

    #[test]
    fn ip_literals_are_valid_server_names() {
        let params = TlsParameters::new("127.0.0.1").expect("IP literal accepted");
        assert!(matches!(params.server_name(), ServerName::IpAddress(_)));
    }
}
