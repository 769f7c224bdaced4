//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! policy file (YAML)
//!     → loader.rs (read & deserialize)
//!     → RawConfig (every field optional)
//!     → policy::build (defaulting, trust pools, supplier)
//! ```
//!
//! # Design Decisions
//! - Loading is read-once; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - The loader checks syntax only, semantic rules live in the builder

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_policy, load_policy_and_paths};
pub use schema::{RawConfig, SecurityPolicySpec};
