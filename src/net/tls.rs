//! TLS configuration assembled from a transport policy.
//!
//! # Responsibilities
//! - Map protocol version bounds and cipher restrictions onto rustls
//! - Pick a client certificate verifier for the client auth mode
//! - Wire the policy's certificate supplier in as the server cert resolver
//! - Build the client-side config for outgoing connections

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::server::WebPkiClientVerifier;
use rustls::{
    ClientConfig, DigitallySignedStruct, DistinguishedName, ServerConfig, SignatureScheme,
    SupportedCipherSuite, SupportedProtocolVersion,
};

use crate::error::PolicyError;
use crate::policy::supplier::SupplierResolver;
use crate::policy::{ClientAuthMode, TransportPolicy};

/// Wire identifier for TLS 1.2.
pub const TLS12: u16 = 0x0303;
/// Wire identifier for TLS 1.3.
pub const TLS13: u16 = 0x0304;

/// Build the rustls server config for a policy.
///
/// The policy must carry a certificate supplier. It is consulted on every
/// handshake, so certificate files can change on disk without a restart.
pub fn server_config(policy: &TransportPolicy) -> Result<ServerConfig, PolicyError> {
    let supplier = policy
        .certificate_supplier()
        .cloned()
        .ok_or(PolicyError::MissingCertificate)?;

    let provider = restricted_provider(policy);
    let versions = protocol_versions(policy);

    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(&versions)?;
    let builder = match client_cert_verifier(policy, &provider)? {
        Some(verifier) => builder.with_client_cert_verifier(verifier),
        None => builder.with_no_client_auth(),
    };

    let mut config = builder.with_cert_resolver(Arc::new(SupplierResolver::new(supplier)));
    config.ignore_client_order = policy.prefer_server_cipher_order();
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(config)
}

/// Build the axum-server TLS config for a policy.
pub fn rustls_config(policy: &TransportPolicy) -> Result<RustlsConfig, PolicyError> {
    Ok(RustlsConfig::from_config(Arc::new(server_config(policy)?)))
}

/// Build the rustls client config for outgoing connections under a policy.
///
/// Servers are verified against the root pool unless verification is
/// skipped. No client certificate is presented.
pub fn client_config(policy: &TransportPolicy) -> Result<ClientConfig, PolicyError> {
    let provider = restricted_provider(policy);
    let versions = protocol_versions(policy);

    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_protocol_versions(&versions)?;
    let builder = if policy.skip_verification() {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoServerVerification::new(provider)))
    } else {
        let roots = policy.root_trust().ok_or(PolicyError::MissingRootTrust)?;
        builder.with_root_certificates(roots.root_store())
    };

    Ok(builder.with_no_client_auth())
}

/// Name to send as SNI and verify against: the policy's override, else `host`.
pub fn verification_name(
    policy: &TransportPolicy,
    host: &str,
) -> Result<ServerName<'static>, PolicyError> {
    let name = policy.server_name().unwrap_or(host);
    Ok(ServerName::try_from(name.to_owned())?)
}

/// Protocol versions inside the policy's bounds, highest first.
///
/// rustls only speaks TLS 1.2 and 1.3; bounds outside that range simply
/// select nothing, and an inverted range selects nothing.
pub fn protocol_versions(policy: &TransportPolicy) -> Vec<&'static SupportedProtocolVersion> {
    let min = policy.min_protocol_version().unwrap_or(0);
    let max = policy.max_protocol_version().unwrap_or(u16::MAX);

    rustls::ALL_VERSIONS
        .iter()
        .copied()
        .filter(|v| (min..=max).contains(&u16::from(v.version)))
        .collect()
}

/// The policy's provider with TLS 1.2 suites narrowed to the allowed list.
///
/// TLS 1.3 suites are not configurable and keep the provider defaults.
fn restricted_provider(policy: &TransportPolicy) -> Arc<CryptoProvider> {
    let base = policy.provider();
    let Some(allowed) = policy.cipher_suites() else {
        return Arc::clone(base);
    };

    let mut suites: Vec<SupportedCipherSuite> = Vec::with_capacity(base.cipher_suites.len());
    for id in allowed {
        let found = base
            .cipher_suites
            .iter()
            .find(|s| matches!(s, SupportedCipherSuite::Tls12(_)) && u16::from(s.suite()) == *id);
        match found {
            Some(suite) if !suites.iter().any(|s| s.suite() == suite.suite()) => {
                suites.push(*suite)
            }
            Some(_) => {}
            None => tracing::warn!(cipher_suite = *id, "Skipping unsupported cipher suite"),
        }
    }
    suites.extend(
        base.cipher_suites
            .iter()
            .filter(|s| matches!(s, SupportedCipherSuite::Tls13(_)))
            .copied(),
    );

    Arc::new(CryptoProvider {
        cipher_suites: suites,
        ..(**base).clone()
    })
}

fn client_cert_verifier(
    policy: &TransportPolicy,
    provider: &Arc<CryptoProvider>,
) -> Result<Option<Arc<dyn ClientCertVerifier>>, PolicyError> {
    let mode = policy.client_auth();
    match mode {
        ClientAuthMode::None => Ok(None),
        ClientAuthMode::Request | ClientAuthMode::RequireAny => Ok(Some(Arc::new(
            AcceptAnyClientCert::new(Arc::clone(provider), mode.is_mandatory()),
        ))),
        ClientAuthMode::VerifyIfGiven | ClientAuthMode::RequireAndVerify => {
            let roots = policy
                .client_trust()
                .ok_or(PolicyError::MissingClientRoots(mode.as_config_str()))?;
            if roots.is_empty() {
                tracing::warn!(
                    client_auth = %mode,
                    "clientCAs has no usable certificates, rejecting all client certificates"
                );
                return Ok(Some(Arc::new(RejectClientCerts::new(
                    Arc::clone(provider),
                    mode.is_mandatory(),
                ))));
            }
            let builder = WebPkiClientVerifier::builder_with_provider(
                roots.root_store(),
                Arc::clone(provider),
            );
            let builder = if mode.is_mandatory() {
                builder
            } else {
                builder.allow_unauthenticated()
            };
            Ok(Some(builder.build()?))
        }
    }
}

/// Requests client certificates without checking them against any pool.
///
/// Handshake signatures are still verified, so the client must hold the key
/// for whatever certificate it presents.
#[derive(Debug)]
struct AcceptAnyClientCert {
    provider: Arc<CryptoProvider>,
    mandatory: bool,
}

impl AcceptAnyClientCert {
    fn new(provider: Arc<CryptoProvider>, mandatory: bool) -> Self {
        Self {
            provider,
            mandatory,
        }
    }
}

impl ClientCertVerifier for AcceptAnyClientCert {
    fn client_auth_mandatory(&self) -> bool {
        self.mandatory
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// Rejects every presented client certificate.
///
/// Stands in for the WebPKI verifier when the client pool is empty, so the
/// listener still starts: anonymous clients pass when the mode allows them,
/// and any chain is refused as having an unknown issuer.
#[derive(Debug)]
struct RejectClientCerts {
    provider: Arc<CryptoProvider>,
    mandatory: bool,
}

impl RejectClientCerts {
    fn new(provider: Arc<CryptoProvider>, mandatory: bool) -> Self {
        Self {
            provider,
            mandatory,
        }
    }
}

impl ClientCertVerifier for RejectClientCerts {
    fn client_auth_mandatory(&self) -> bool {
        self.mandatory
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        Err(rustls::Error::InvalidCertificate(
            rustls::CertificateError::UnknownIssuer,
        ))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// Accepts any server certificate. Only installed for `insecureSkipVerify`.
#[derive(Debug)]
struct NoServerVerification {
    provider: Arc<CryptoProvider>,
}

impl NoServerVerification {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for NoServerVerification {
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
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawConfig, SecurityPolicySpec};
    use crate::policy::build;

    fn policy_with(spec: SecurityPolicySpec) -> TransportPolicy {
        build(&RawConfig {
            cert_path: Some("server.crt".into()),
            key_path: Some("server.key".into()),
            security_policy: spec,
        })
        .unwrap()
    }

    fn version_ids(policy: &TransportPolicy) -> Vec<u16> {
        protocol_versions(policy)
            .iter()
            .map(|v| u16::from(v.version))
            .collect()
    }

    #[test]
    fn unset_bounds_keep_all_versions() {
        let policy = policy_with(SecurityPolicySpec::default());
        assert_eq!(version_ids(&policy), vec![TLS13, TLS12]);
    }

    #[test]
    fn bounds_narrow_versions() {
        let policy = policy_with(SecurityPolicySpec {
            max_protocol_version: TLS12,
            ..SecurityPolicySpec::default()
        });
        assert_eq!(version_ids(&policy), vec![TLS12]);

        let policy = policy_with(SecurityPolicySpec {
            min_protocol_version: TLS13,
            ..SecurityPolicySpec::default()
        });
        assert_eq!(version_ids(&policy), vec![TLS13]);

        // TLS 1.0 floor still admits everything rustls speaks.
        let policy = policy_with(SecurityPolicySpec {
            min_protocol_version: 0x0301,
            ..SecurityPolicySpec::default()
        });
        assert_eq!(version_ids(&policy), vec![TLS13, TLS12]);
    }

    #[test]
    fn inverted_bounds_select_nothing() {
        let policy = policy_with(SecurityPolicySpec {
            min_protocol_version: TLS13,
            max_protocol_version: TLS12,
            ..SecurityPolicySpec::default()
        });
        assert!(protocol_versions(&policy).is_empty());
    }

    #[test]
    fn inverted_bounds_rejected_by_rustls() {
        let policy = policy_with(SecurityPolicySpec {
            min_protocol_version: TLS13,
            max_protocol_version: TLS12,
            ..SecurityPolicySpec::default()
        });
        assert!(matches!(server_config(&policy), Err(PolicyError::Tls(_))));
        assert!(matches!(rustls_config(&policy), Err(PolicyError::Tls(_))));
    }

    #[test]
    fn cipher_restriction_keeps_order_and_tls13() {
        let policy = policy_with(SecurityPolicySpec {
            // ECDHE-RSA-AES128-GCM, unknown, ECDHE-ECDSA-AES256-GCM
            allowed_cipher_suites: vec![0xc02f, 0x0005, 0xc02c],
            ..SecurityPolicySpec::default()
        });
        let provider = restricted_provider(&policy);

        let tls12: Vec<u16> = provider
            .cipher_suites
            .iter()
            .filter(|s| matches!(s, SupportedCipherSuite::Tls12(_)))
            .map(|s| u16::from(s.suite()))
            .collect();
        assert_eq!(tls12, vec![0xc02f, 0xc02c]);
        assert!(provider
            .cipher_suites
            .iter()
            .any(|s| matches!(s, SupportedCipherSuite::Tls13(_))));
    }

    #[test]
    fn no_restriction_shares_provider() {
        let policy = policy_with(SecurityPolicySpec::default());
        assert!(Arc::ptr_eq(&restricted_provider(&policy), policy.provider()));
    }

    #[test]
    fn server_config_applies_preferences() {
        let policy = policy_with(SecurityPolicySpec {
            prefer_server_cipher_order: true,
            ..SecurityPolicySpec::default()
        });
        let config = server_config(&policy).unwrap();
        assert!(config.ignore_client_order);
        assert_eq!(config.alpn_protocols, vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
    }

    #[test]
    fn server_config_needs_certificate() {
        let policy = build(&RawConfig::default()).unwrap();
        assert!(matches!(server_config(&policy), Err(PolicyError::MissingCertificate)));
    }

    #[test]
    fn verifying_modes_need_client_roots() {
        for mode in ["VerifyClientCertIfGiven", "RequireAndVerifyClientCert"] {
            let policy = policy_with(SecurityPolicySpec {
                client_auth_mode: Some(mode.into()),
                ..SecurityPolicySpec::default()
            });
            assert!(matches!(
                server_config(&policy),
                Err(PolicyError::MissingClientRoots(_))
            ));
        }
    }

    #[test]
    fn non_verifying_modes_build_without_roots() {
        for mode in ["RequestClientCert", "RequireClientCert"] {
            let policy = policy_with(SecurityPolicySpec {
                client_auth_mode: Some(mode.into()),
                ..SecurityPolicySpec::default()
            });
            assert!(server_config(&policy).is_ok());
        }
    }

    #[test]
    fn client_config_needs_roots_unless_skipping() {
        let policy = policy_with(SecurityPolicySpec::default());
        assert!(matches!(client_config(&policy), Err(PolicyError::MissingRootTrust)));

        let policy = policy_with(SecurityPolicySpec {
            skip_verification: true,
            ..SecurityPolicySpec::default()
        });
        assert!(client_config(&policy).is_ok());
    }

    #[test]
    fn verification_name_prefers_override() {
        let policy = policy_with(SecurityPolicySpec {
            server_name: Some("api.internal".into()),
            ..SecurityPolicySpec::default()
        });
        let name = verification_name(&policy, "10.0.0.7").unwrap();
        assert_eq!(name, ServerName::try_from("api.internal").unwrap());

        let policy = policy_with(SecurityPolicySpec::default());
        let name = verification_name(&policy, "localhost").unwrap();
        assert_eq!(name, ServerName::try_from("localhost").unwrap());
    }
}
