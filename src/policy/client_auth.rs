//! Client certificate requirement levels.

use std::fmt;

/// How strictly the server asks for client certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuthMode {
    /// No client certificate is requested.
    #[default]
    None,
    /// A certificate is requested but not required or verified.
    Request,
    /// A certificate is required but not verified against a pool.
    RequireAny,
    /// A certificate is optional; if presented it must verify.
    VerifyIfGiven,
    /// A certificate is required and must verify.
    RequireAndVerify,
}

impl ClientAuthMode {
    /// Map a config string to a mode.
    ///
    /// Matching is exact and case-sensitive. Anything unrecognized, typos
    /// included, falls through to [`ClientAuthMode::None`].
    pub fn from_config_str(value: &str) -> Self {
        match value {
            "RequestClientCert" => Self::Request,
            "RequireClientCert" => Self::RequireAny,
            "VerifyClientCertIfGiven" => Self::VerifyIfGiven,
            "RequireAndVerifyClientCert" => Self::RequireAndVerify,
            _ => Self::None,
        }
    }

    /// The config string that selects this mode.
    pub fn as_config_str(&self) -> &'static str {
        match self {
            Self::None => "NoClientCert",
            Self::Request => "RequestClientCert",
            Self::RequireAny => "RequireClientCert",
            Self::VerifyIfGiven => "VerifyClientCertIfGiven",
            Self::RequireAndVerify => "RequireAndVerifyClientCert",
        }
    }

    /// Whether a handshake without a client certificate is rejected.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::RequireAny | Self::RequireAndVerify)
    }

    /// Whether presented certificates are checked against the client pool.
    pub fn verifies_chain(&self) -> bool {
        matches!(self, Self::VerifyIfGiven | Self::RequireAndVerify)
    }
}

impl fmt::Display for ClientAuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_config_str())
    }
}
