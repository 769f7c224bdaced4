//! Error types for policy loading, building, and serving.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a policy file or assembling TLS configs from it.
///
/// Any of these during startup is fatal: the process exits rather than
/// running with a partially built policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the expected shape.
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A trust bundle (`rootCAs` / `clientCAs`) could not be read.
    #[error("failed to read trust bundle {path:?}: {source}")]
    TrustStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `tlsCertPath` is set but `tlsKeyPath` is not.
    #[error("tlsCertPath {0:?} is set without a tlsKeyPath")]
    MissingKeyPath(PathBuf),

    /// A server config was requested from a policy with no certificate.
    #[error("policy has no certificate supplier")]
    MissingCertificate,

    /// Client certificate verification was requested with no `clientCAs`.
    #[error("client auth mode {0} requires clientCAs")]
    MissingClientRoots(&'static str),

    /// Server verification was requested with no `rootCAs`.
    #[error("server verification requires rootCAs or insecureSkipVerify")]
    MissingRootTrust,

    /// The configured server name is not a valid DNS name or IP address.
    #[error("invalid server name: {0}")]
    InvalidServerName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A client certificate verifier could not be built from the client pool.
    #[error("client verifier error: {0}")]
    Verifier(#[from] rustls::server::VerifierBuilderError),

    /// rustls rejected the assembled configuration.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),
}

/// Errors raised by a certificate supplier while loading a key pair.
///
/// These surface during a handshake, not at build time, and abort only the
/// connection that triggered the load.
#[derive(Debug, Error)]
pub enum CertLoadError {
    /// Certificate or key file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate file held no PEM certificates.
    #[error("no certificates found in {0:?}")]
    NoCertificates(PathBuf),

    /// The key file held no PEM private key.
    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    /// The private key is not usable by the crypto provider.
    #[error("unsupported or malformed private key: {0}")]
    InvalidKey(#[source] rustls::Error),

    /// The private key does not belong to the leaf certificate.
    #[error("private key does not match certificate: {0}")]
    KeyMismatch(#[source] rustls::Error),
}

/// Errors returned by the listener dispatcher.
#[derive(Debug, Error)]
pub enum ServeError {
    /// TLS config could not be assembled from the attached policy.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The underlying listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
