//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::RawConfig;
use crate::error::PolicyError;
use crate::policy::{build, TransportPolicy};

/// Load a policy file into its raw form.
///
/// Only syntax and field types are checked here; cross-field rules belong to
/// the builder.
pub fn load_config(path: &Path) -> Result<RawConfig, PolicyError> {
    let content = fs::read_to_string(path).map_err(|source| PolicyError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // An empty YAML document carries no fields at all.
    if content.trim().is_empty() {
        tracing::debug!(path = ?path, "Policy file is empty, using defaults");
        return Ok(RawConfig::default());
    }

    // A document holding only `~` is as empty as a blank file.
    let raw: Option<RawConfig> =
        serde_yaml::from_str(&content).map_err(|source| PolicyError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(raw.unwrap_or_default())
}

/// Load a policy file and build it.
pub fn load_policy(path: &Path) -> Result<TransportPolicy, PolicyError> {
    load_policy_and_paths(path).map(|(policy, _, _)| policy)
}

/// Load a policy file, build it, and return the configured cert and key paths.
pub fn load_policy_and_paths(
    path: &Path,
) -> Result<(TransportPolicy, Option<PathBuf>, Option<PathBuf>), PolicyError> {
    let raw = load_config(path)?;
    let policy = build(&raw)?;

    tracing::info!(
        path = ?path,
        tls = policy.has_certificate_supplier(),
        client_auth = %policy.client_auth(),
        "Transport policy loaded"
    );

    Ok((policy, raw.cert_path, raw.key_path))
}
