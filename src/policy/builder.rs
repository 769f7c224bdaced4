//! Policy construction from a raw config.
//!
//! Each field is applied independently. A missing field leaves the matching
//! policy field unset and is never an error on its own.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;

use crate::config::RawConfig;
use crate::error::PolicyError;
use crate::policy::client_auth::ClientAuthMode;
use crate::policy::supplier::{CertificateSupplier, FileCertificateSupplier};
use crate::policy::trust::TrustPool;
use crate::policy::TransportPolicy;

/// Build a policy using the ring crypto provider.
pub fn build(raw: &RawConfig) -> Result<TransportPolicy, PolicyError> {
    build_with_provider(raw, Arc::new(rustls::crypto::ring::default_provider()))
}

/// Build a policy with an explicit crypto provider.
pub fn build_with_provider(
    raw: &RawConfig,
    provider: Arc<CryptoProvider>,
) -> Result<TransportPolicy, PolicyError> {
    let spec = &raw.security_policy;

    let certificate_supplier = match non_empty_path(&raw.cert_path) {
        Some(cert_path) => {
            let key_path = non_empty_path(&raw.key_path)
                .ok_or_else(|| PolicyError::MissingKeyPath(cert_path.to_path_buf()))?;
            let supplier: Arc<dyn CertificateSupplier> = Arc::new(FileCertificateSupplier::new(
                cert_path.to_path_buf(),
                key_path.to_path_buf(),
                Arc::clone(&provider),
            ));
            Some(supplier)
        }
        None => None,
    };

    let server_name = spec.server_name.clone().filter(|name| !name.is_empty());

    if spec.skip_verification {
        tracing::warn!("insecureSkipVerify is set, server certificates will not be verified");
    }

    let cipher_suites =
        Some(spec.allowed_cipher_suites.clone()).filter(|suites| !suites.is_empty());

    let min_protocol_version = Some(spec.min_protocol_version).filter(|v| *v != 0);
    let max_protocol_version = Some(spec.max_protocol_version).filter(|v| *v != 0);

    let root_trust = non_empty_path(&spec.trusted_roots_path)
        .map(TrustPool::from_pem_file)
        .transpose()?;
    let client_trust = non_empty_path(&spec.trusted_client_roots_path)
        .map(TrustPool::from_pem_file)
        .transpose()?;

    let client_auth = match spec.client_auth_mode.as_deref() {
        Some(value) if !value.is_empty() => {
            let mode = ClientAuthMode::from_config_str(value);
            if mode == ClientAuthMode::None {
                tracing::warn!(
                    value = %value,
                    "Unrecognized clientAuth value, no client certificate will be requested"
                );
            }
            mode
        }
        _ => ClientAuthMode::None,
    };

    Ok(TransportPolicy {
        provider,
        certificate_supplier,
        server_name,
        skip_verification: spec.skip_verification,
        cipher_suites,
        prefer_server_cipher_order: spec.prefer_server_cipher_order,
        min_protocol_version,
        max_protocol_version,
        root_trust,
        client_trust,
        client_auth,
    })
}

fn non_empty_path(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}
