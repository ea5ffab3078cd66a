//! TLS material loading for the HTTPS listener.

use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::config::TlsFiles;
use crate::SrvError;

/// ALPN protocols offered to clients.
const ALPN_HTTP1: &[u8] = b"http/1.1";

/// Build a TLS acceptor from PEM certificate chain and key files.
pub fn acceptor(files: &TlsFiles) -> crate::Result<TlsAcceptor> {
    Ok(TlsAcceptor::from(server_config(files)?))
}

/// Build the rustls server config, using ring as the crypto provider.
pub fn server_config(files: &TlsFiles) -> crate::Result<Arc<ServerConfig>> {
    let certs = load_certs(&files.cert_file)?;
    let key = load_key(&files.key_file)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| SrvError::Tls(format!("unsupported protocol versions: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| SrvError::Tls(format!("invalid certificate or key: {e}")))?;

    config.alpn_protocols = vec![ALPN_HTTP1.to_vec()];

    Ok(Arc::new(config))
}

fn load_certs(path: &Path) -> crate::Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| SrvError::Tls(format!("failed to read {}: {e:?}", path.display())))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SrvError::Tls(format!("failed to parse {}: {e:?}", path.display())))?;

    if certs.is_empty() {
        return Err(SrvError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }

    Ok(certs)
}

fn load_key(path: &Path) -> crate::Result<PrivateKeyDer<'static>> {
    PrivateKeyDer::from_pem_file(path)
        .map_err(|e| SrvError::Tls(format!("failed to load key {}: {e:?}", path.display())))
}
