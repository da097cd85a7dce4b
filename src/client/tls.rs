//! TLS client setup for the tracing transport

use crate::error::{AppError, Result};
use rustls::{pki_types::ServerName, ClientConfig, RootCertStore};
use std::sync::Arc;
use tokio_rustls::TlsConnector;

/// Client configuration trusting the webpki root set, using the ring provider
pub fn client_config() -> Result<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    client_config_with_roots(roots)
}

pub fn client_config_with_roots(roots: RootCertStore) -> Result<Arc<ClientConfig>> {
    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| AppError::internal(format!("TLS configuration failed: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

pub fn connector() -> Result<TlsConnector> {
    Ok(TlsConnector::from(client_config()?))
}

/// SNI / verification name for a URL host. IP literals are accepted.
pub fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|e| AppError::request_construction(format!("Invalid TLS server name '{}': {}", host, e)))
}
