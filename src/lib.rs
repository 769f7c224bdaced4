//! Transport security policy loading and plaintext/TLS listener dispatch.

pub mod config;
pub mod error;
pub mod net;
pub mod policy;

pub use config::{load_config, load_policy, load_policy_and_paths, RawConfig};
pub use error::{CertLoadError, PolicyError, ServeError};
pub use net::{serve, ListenMode, Server};
pub use policy::{build, ClientAuthMode, TransportPolicy};
