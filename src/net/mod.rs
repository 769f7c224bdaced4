//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Server (bound listener + router + optional policy)
//!     → listener.rs (pick plaintext or TLS, serve until shutdown)
//!     → tls.rs (rustls configs from the policy)
//!     → per handshake: policy supplier loads cert + key
//! ```
//!
//! # Design Decisions
//! - TLS is chosen solely by whether a policy with a certificate is attached
//! - A failed certificate load aborts that handshake only

pub mod listener;
pub mod tls;

pub use listener::{serve, ListenMode, Server};
