//! transport-policy server
//!
//! Loads a transport policy file and serves a health endpoint over TLS or
//! plaintext, depending on whether the policy names a certificate.
//!
//! ```text
//!   policy.yml ──▶ loader ──▶ builder ──▶ TransportPolicy
//!                                              │
//!   --bind ──▶ TcpListener ──▶ Server ◀────────┘
//!                                │
//!                       plaintext │ TLS (cert re-read per handshake)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{routing::get, Router};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transport_policy::{load_policy, serve, Server};

#[derive(Parser)]
#[command(name = "transport-policy")]
#[command(
    about = "Serve HTTP over plaintext or TLS according to a transport policy file",
    long_about = None
)]
struct Cli {
    /// Transport policy file (YAML). Without one the server runs plaintext.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0:8443")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transport_policy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("transport-policy v{} starting", env!("CARGO_PKG_VERSION"));

    // Startup failures are fatal; never run with a partial policy.
    let policy = match cli.config.as_deref().map(load_policy).transpose() {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load transport policy");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let router = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http());

    let mut server = Server::bind(cli.bind, router)?;
    if let Some(policy) = policy {
        server = server.with_policy(policy);
    }

    tracing::info!(
        address = %server.local_addr()?,
        mode = ?server.listen_mode(),
        "Listener bound"
    );

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            handle.graceful_shutdown(None);
        }
    });

    serve(server).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
