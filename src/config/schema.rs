//! Configuration schema definitions.
//!
//! Field names follow the on-disk YAML keys. Every field is optional; the
//! builder decides what "unset" means for each one.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Root of a transport policy file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RawConfig {
    /// Path to the PEM certificate chain served by the listener.
    #[serde(rename = "tlsCertPath")]
    pub cert_path: Option<PathBuf>,

    /// Path to the PEM private key matching `cert_path`.
    #[serde(rename = "tlsKeyPath")]
    pub key_path: Option<PathBuf>,

    /// TLS parameters.
    #[serde(rename = "tlsConfig", deserialize_with = "null_as_default")]
    pub security_policy: SecurityPolicySpec,
}

/// TLS parameters embedded under `tlsConfig`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SecurityPolicySpec {
    /// PEM bundle used to verify servers we connect to.
    #[serde(rename = "rootCAs")]
    pub trusted_roots_path: Option<PathBuf>,

    /// Name used for SNI and server name verification.
    #[serde(rename = "serverName")]
    pub server_name: Option<String>,

    /// One of the `ClientAuthMode` config strings.
    #[serde(rename = "clientAuth")]
    pub client_auth_mode: Option<String>,

    /// PEM bundle used to verify client certificates.
    #[serde(rename = "clientCAs")]
    pub trusted_client_roots_path: Option<PathBuf>,

    #[serde(rename = "insecureSkipVerify", deserialize_with = "null_as_default")]
    pub skip_verification: bool,

    /// IANA cipher suite identifiers, in preference order.
    #[serde(rename = "cipherSuites", deserialize_with = "null_as_default")]
    pub allowed_cipher_suites: Vec<u16>,

    #[serde(rename = "preferServerCipherSuites", deserialize_with = "null_as_default")]
    pub prefer_server_cipher_order: bool,

    /// Wire protocol version, e.g. `0x0303` for TLS 1.2. Zero means unset.
    #[serde(rename = "minVersion", deserialize_with = "null_as_default")]
    pub min_protocol_version: u16,

    /// Wire protocol version, e.g. `0x0304` for TLS 1.3. Zero means unset.
    #[serde(rename = "maxVersion", deserialize_with = "null_as_default")]
    pub max_protocol_version: u16,
}

/// Treat an explicit YAML null (`~`, `null`, or a bare key) like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
