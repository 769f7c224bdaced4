//! Transport security policy.
//!
//! # Data Flow
//! ```text
//! RawConfig
//!     → builder.rs (defaulting, trust pools, client auth mapping)
//!     → TransportPolicy (immutable)
//!     → net::tls (rustls server/client configs)
//!
//! Per handshake:
//!     supplier.rs (re-read cert + key from disk) → rustls
//! ```
//!
//! # Design Decisions
//! - "Unset" is an explicit `None`, never a zero value
//! - Only the trust bundles are read at build time; key material is read lazily
//! - The policy is built once and never mutated

pub mod builder;
pub mod client_auth;
pub mod supplier;
pub mod trust;

use std::fmt;
use std::sync::Arc;

use rustls::crypto::CryptoProvider;

pub use builder::{build, build_with_provider};
pub use client_auth::ClientAuthMode;
pub use supplier::{CachedCertificateSupplier, CertificateSupplier, FileCertificateSupplier};
pub use trust::TrustPool;

/// Resolved TLS parameters for one server.
#[derive(Clone)]
pub struct TransportPolicy {
    pub(crate) provider: Arc<CryptoProvider>,
    pub(crate) certificate_supplier: Option<Arc<dyn CertificateSupplier>>,
    pub(crate) server_name: Option<String>,
    pub(crate) skip_verification: bool,
    pub(crate) cipher_suites: Option<Vec<u16>>,
    pub(crate) prefer_server_cipher_order: bool,
    pub(crate) min_protocol_version: Option<u16>,
    pub(crate) max_protocol_version: Option<u16>,
    pub(crate) root_trust: Option<TrustPool>,
    pub(crate) client_trust: Option<TrustPool>,
    pub(crate) client_auth: ClientAuthMode,
}

impl TransportPolicy {
    /// Crypto provider used for key loading and handshakes.
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    /// Capability that loads the key pair for each handshake.
    pub fn certificate_supplier(&self) -> Option<&Arc<dyn CertificateSupplier>> {
        self.certificate_supplier.as_ref()
    }

    /// Whether this policy can serve TLS.
    pub fn has_certificate_supplier(&self) -> bool {
        self.certificate_supplier.is_some()
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Insecure: outgoing connections accept any server certificate.
    pub fn skip_verification(&self) -> bool {
        self.skip_verification
    }

    /// Allowed TLS 1.2 suites in preference order; `None` means provider defaults.
    pub fn cipher_suites(&self) -> Option<&[u16]> {
        self.cipher_suites.as_deref()
    }

    pub fn prefer_server_cipher_order(&self) -> bool {
        self.prefer_server_cipher_order
    }

    pub fn min_protocol_version(&self) -> Option<u16> {
        self.min_protocol_version
    }

    pub fn max_protocol_version(&self) -> Option<u16> {
        self.max_protocol_version
    }

    /// Roots used to verify servers we connect to.
    pub fn root_trust(&self) -> Option<&TrustPool> {
        self.root_trust.as_ref()
    }

    /// Roots used to verify client certificates.
    pub fn client_trust(&self) -> Option<&TrustPool> {
        self.client_trust.as_ref()
    }

    pub fn client_auth(&self) -> ClientAuthMode {
        self.client_auth
    }
}

impl fmt::Debug for TransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportPolicy")
            .field("certificate_supplier", &self.certificate_supplier)
            .field("server_name", &self.server_name)
            .field("skip_verification", &self.skip_verification)
            .field("cipher_suites", &self.cipher_suites)
            .field("prefer_server_cipher_order", &self.prefer_server_cipher_order)
            .field("min_protocol_version", &self.min_protocol_version)
            .field("max_protocol_version", &self.max_protocol_version)
            .field("root_trust", &self.root_trust.as_ref().map(TrustPool::len))
            .field("client_trust", &self.client_trust.as_ref().map(TrustPool::len))
            .field("client_auth", &self.client_auth)
            .finish()
    }
}
