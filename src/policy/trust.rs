//! Trust pools built from PEM bundles.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;

use crate::error::PolicyError;

/// A set of trust anchors loaded from one PEM bundle.
#[derive(Debug, Clone)]
pub struct TrustPool {
    certificates: Vec<CertificateDer<'static>>,
    store: Arc<RootCertStore>,
}

impl TrustPool {
    /// Read a PEM bundle and keep every certificate that parses.
    ///
    /// An unreadable file is an error. Blocks that fail to decode, or decode to
    /// something that is not a usable trust anchor, are dropped with a warning
    /// and never fail the load.
    pub fn from_pem_file(path: &Path) -> Result<Self, PolicyError> {
        let content = fs::read(path).map_err(|source| PolicyError::TrustStore {
            path: path.to_path_buf(),
            source,
        })?;

        let pool = Self::from_pem(&content);
        tracing::debug!(path = ?path, certificates = pool.len(), "Trust pool loaded");
        Ok(pool)
    }

    /// Build a pool from in-memory PEM content.
    pub fn from_pem(mut content: &[u8]) -> Self {
        let mut certificates = Vec::new();
        let mut store = RootCertStore::empty();

        for item in rustls_pemfile::certs(&mut content) {
            let cert = match item {
                Ok(cert) => cert,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable certificate block");
                    continue;
                }
            };
            match store.add(cert.clone()) {
                Ok(()) => certificates.push(cert),
                Err(e) => tracing::warn!(error = %e, "Skipping unusable trust anchor"),
            }
        }

        Self {
            certificates,
            store: Arc::new(store),
        }
    }

    /// The accepted certificates, in bundle order.
    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }

    /// Root store for rustls verifiers.
    pub fn root_store(&self) -> Arc<RootCertStore> {
        Arc::clone(&self.store)
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

impl PartialEq for TrustPool {
    fn eq(&self, other: &Self) -> bool {
        self.certificates == other.certificates
    }
}

impl Eq for TrustPool {}
