//! Certificate suppliers.
//!
//! # Responsibilities
//! - Produce the key pair presented during a TLS handshake
//! - Re-read certificate and key from disk on every call
//! - Bridge suppliers into rustls as a server certificate resolver
//!
//! # Design Decisions
//! - Suppliers are called concurrently from connection tasks and hold no
//!   mutable state
//! - Load failures abort the handshake that asked, never the listener

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use rustls::crypto::CryptoProvider;
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;

use crate::error::CertLoadError;

/// Supplies the key pair to present for a handshake.
pub trait CertificateSupplier: fmt::Debug + Send + Sync {
    /// Return the current certificate chain and signing key.
    fn supply(&self) -> Result<Arc<CertifiedKey>, CertLoadError>;
}

/// Loads a PEM certificate chain and private key from disk on every call.
pub struct FileCertificateSupplier {
    cert_path: PathBuf,
    key_path: PathBuf,
    provider: Arc<CryptoProvider>,
}

impl FileCertificateSupplier {
    pub fn new(cert_path: PathBuf, key_path: PathBuf, provider: Arc<CryptoProvider>) -> Self {
        Self {
            cert_path,
            key_path,
            provider,
        }
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

impl fmt::Debug for FileCertificateSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCertificateSupplier")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .finish()
    }
}

impl CertificateSupplier for FileCertificateSupplier {
    fn supply(&self) -> Result<Arc<CertifiedKey>, CertLoadError> {
        load_key_pair(&self.cert_path, &self.key_path, &self.provider).map(Arc::new)
    }
}

/// Load a certificate chain and its private key, checking they belong together.
pub fn load_key_pair(
    cert_path: &Path,
    key_path: &Path,
    provider: &CryptoProvider,
) -> Result<CertifiedKey, CertLoadError> {
    let cert_pem = read(cert_path)?;
    let chain = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CertLoadError::Io {
            path: cert_path.to_path_buf(),
            source,
        })?;
    if chain.is_empty() {
        return Err(CertLoadError::NoCertificates(cert_path.to_path_buf()));
    }

    let key_pem = read(key_path)?;
    let key_der = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .map_err(|source| CertLoadError::Io {
            path: key_path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| CertLoadError::NoPrivateKey(key_path.to_path_buf()))?;

    let signing_key = provider
        .key_provider
        .load_private_key(key_der)
        .map_err(CertLoadError::InvalidKey)?;

    let certified = CertifiedKey::new(chain, signing_key);
    match certified.keys_match() {
        // Some signing keys cannot expose their public half; accept those.
        Ok(()) | Err(rustls::Error::InconsistentKeys(rustls::InconsistentKeys::Unknown)) => {
            Ok(certified)
        }
        Err(e) => Err(CertLoadError::KeyMismatch(e)),
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CertLoadError> {
    fs::read(path).map_err(|source| CertLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads once through the wrapped supplier and serves that key pair forever.
///
/// A failed first load is not remembered; the next call tries again.
#[derive(Debug)]
pub struct CachedCertificateSupplier<S> {
    inner: S,
    cached: OnceLock<Arc<CertifiedKey>>,
}

impl<S: CertificateSupplier> CachedCertificateSupplier<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cached: OnceLock::new(),
        }
    }
}

impl<S: CertificateSupplier> CertificateSupplier for CachedCertificateSupplier<S> {
    fn supply(&self) -> Result<Arc<CertifiedKey>, CertLoadError> {
        if let Some(key) = self.cached.get() {
            return Ok(Arc::clone(key));
        }
        let key = self.inner.supply()?;
        Ok(Arc::clone(self.cached.get_or_init(|| key)))
    }
}

/// rustls resolver that asks a supplier for every handshake.
///
/// rustls calls `resolve` synchronously, so a file-backed supplier performs
/// blocking `std::fs` reads on whichever Tokio worker drives the handshake.
/// A hanging filesystem stalls every connection scheduled on that worker,
/// not only the handshake that triggered the read. Keep certificate files on
/// local storage, or wrap the supplier in [`CachedCertificateSupplier`].
#[derive(Debug)]
pub struct SupplierResolver {
    supplier: Arc<dyn CertificateSupplier>,
}

impl SupplierResolver {
    pub fn new(supplier: Arc<dyn CertificateSupplier>) -> Self {
        Self { supplier }
    }
}

impl ResolvesServerCert for SupplierResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        match self.supplier.supply() {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    server_name = ?client_hello.server_name(),
                    "Certificate load failed, aborting handshake"
                );
                None
            }
        }
    }
}
