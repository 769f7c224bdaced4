//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, ClientConnection, Connection, ServerConfig, ServerConnection};

/// A self-signed certificate and its key, in PEM form.
pub struct Identity {
    pub cert_pem: String,
    pub key_pem: String,
}

impl Identity {
    pub fn generate(name: &str) -> Self {
        let generated = rcgen::generate_simple_self_signed(vec![name.to_string()]).unwrap();
        Self {
            cert_pem: generated.cert.pem(),
            key_pem: generated.signing_key.serialize_pem(),
        }
    }

    pub fn chain(&self) -> Vec<CertificateDer<'static>> {
        rustls_pemfile::certs(&mut self.cert_pem.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    pub fn key(&self) -> PrivateKeyDer<'static> {
        rustls_pemfile::private_key(&mut self.key_pem.as_bytes())
            .unwrap()
            .unwrap()
    }

    /// Write `<stem>.crt` and `<stem>.key` into `dir`.
    pub fn write_to(&self, dir: &Path, stem: &str) -> (PathBuf, PathBuf) {
        let cert = write_file(dir, &format!("{stem}.crt"), &self.cert_pem);
        let key = write_file(dir, &format!("{stem}.key"), &self.key_pem);
        (cert, key)
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Client config trusting `roots`, optionally presenting `identity`.
pub fn client_trusting(roots: &Identity, identity: Option<&Identity>) -> ClientConfig {
    let mut store = rustls::RootCertStore::empty();
    for cert in roots.chain() {
        store.add(cert).unwrap();
    }
    let builder = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_root_certificates(store);
    match identity {
        Some(identity) => builder
            .with_client_auth_cert(identity.chain(), identity.key())
            .unwrap(),
        None => builder.with_no_client_auth(),
    }
}

/// Run an in-memory handshake between the two configs.
///
/// Returns the client connection on success so callers can inspect what was
/// negotiated.
pub fn handshake(
    client_config: ClientConfig,
    server_config: ServerConfig,
    server_name: &str,
) -> Result<Connection, rustls::Error> {
    let name = server_name.to_string().try_into().unwrap();
    let mut client: Connection = ClientConnection::new(Arc::new(client_config), name)?.into();
    let mut server: Connection = ServerConnection::new(Arc::new(server_config))?.into();

    for _ in 0..16 {
        transfer(&mut client, &mut server)?;
        transfer(&mut server, &mut client)?;
        if !client.is_handshaking() && !server.is_handshaking() {
            return Ok(client);
        }
    }
    panic!("handshake did not finish");
}

fn transfer(from: &mut Connection, to: &mut Connection) -> Result<(), rustls::Error> {
    let mut buf = Vec::new();
    while from.wants_write() {
        from.write_tls(&mut buf).unwrap();
    }
    let mut rd = &buf[..];
    while !rd.is_empty() {
        to.read_tls(&mut rd).unwrap();
        to.process_new_packets()?;
    }
    Ok(())
}

const GET_HEALTHZ: &[u8] =
    b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";

/// Plain HTTP/1.1 GET against `/healthz`.
pub fn http_get(addr: SocketAddr) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.write_all(GET_HEALTHZ)?;

    let mut out = Vec::new();
    let _ = stream.read_to_end(&mut out);
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// HTTPS GET against `/healthz`. Handshake failures surface as errors.
pub fn https_get(
    addr: SocketAddr,
    config: ClientConfig,
    server_name: rustls::pki_types::ServerName<'static>,
) -> std::io::Result<String> {
    let conn = ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;

    let mut tls = rustls::StreamOwned::new(conn, stream);
    tls.write_all(GET_HEALTHZ)?;
    tls.flush()?;

    // Peers may close without close_notify; keep whatever arrived.
    let mut out = Vec::new();
    let _ = tls.read_to_end(&mut out);
    if out.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "no response",
        ));
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}
