//! Listener dispatch: plaintext or TLS.
//!
//! # Responsibilities
//! - Own a bound TCP listener, the HTTP router, and an optional policy
//! - Serve TLS when a policy with a certificate is attached, plaintext otherwise
//! - Expose a handle so the listener can be closed from outside
//!
//! # Design Decisions
//! - No retry or restart: listener errors are returned unchanged
//! - The TLS config is assembled once at serve time; key material is still
//!   re-read on every handshake through the policy's supplier

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::error::ServeError;
use crate::net::tls::rustls_config;
use crate::policy::TransportPolicy;

/// How a server will accept connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    Plaintext,
    Tls,
}

/// A bound listener waiting to be served.
pub struct Server {
    listener: std::net::TcpListener,
    router: Router,
    policy: Option<TransportPolicy>,
    handle: Handle,
}

impl Server {
    /// Bind to `addr` with no policy attached.
    pub fn bind(addr: SocketAddr, router: Router) -> Result<Self, ServeError> {
        let listener = std::net::TcpListener::bind(addr)?;
        Self::from_listener(listener, router)
    }

    /// Wrap an already bound listener.
    pub fn from_listener(
        listener: std::net::TcpListener,
        router: Router,
    ) -> Result<Self, ServeError> {
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            router,
            policy: None,
            handle: Handle::new(),
        })
    }

    /// Attach a transport policy.
    ///
    /// A policy without a certificate cannot serve TLS and leaves the server
    /// in plaintext mode.
    pub fn with_policy(mut self, policy: TransportPolicy) -> Self {
        if policy.has_certificate_supplier() {
            self.policy = Some(policy);
        } else {
            tracing::info!("Policy has no certificate, listener will serve plaintext");
            self.policy = None;
        }
        self
    }

    pub fn policy(&self) -> Option<&TransportPolicy> {
        self.policy.as_ref()
    }

    pub fn listen_mode(&self) -> ListenMode {
        match self.policy {
            Some(_) => ListenMode::Tls,
            None => ListenMode::Plaintext,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Handle for shutting the listener down from another task.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }
}

/// Serve until the listener terminates.
///
/// Returns `Ok(())` after the handle shuts the listener down, or the
/// underlying I/O error if the listener fails.
pub async fn serve(server: Server) -> Result<(), ServeError> {
    let Server {
        listener,
        router,
        policy,
        handle,
    } = server;
    let addr = listener.local_addr()?;
    let app = router.into_make_service();

    match policy {
        Some(policy) => {
            let config = rustls_config(&policy)?;
            tracing::info!(
                address = %addr,
                client_auth = %policy.client_auth(),
                "Serving TLS"
            );
            axum_server::from_tcp_rustls(listener, config)
                .handle(handle)
                .serve(app)
                .await?;
        }
        None => {
            tracing::info!(address = %addr, "Serving plaintext");
            axum_server::from_tcp(listener).handle(handle).serve(app).await?;
        }
    }

    tracing::info!(address = %addr, "Listener stopped");
    Ok(())
}
