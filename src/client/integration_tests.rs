//! Probe integration tests against local servers
//!
//! Mock servers listen on 127.0.0.1 over plain HTTP, so traced exchanges
//! skip DNS and TLS unless the address names `localhost` or the server is
//! the local TLS one.

use super::*;
use crate::{
    logging::LoggerFactory,
    models::{Checkpoint, CheckpointRecorder, Config},
    types::Tier,
};
use rustls::{
    pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer},
    RootCertStore, ServerConfig,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};
use tokio_rustls::{TlsAcceptor, TlsConnector};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock HTTP server for controlled probe scenarios
struct MockRegionServer {
    server: MockServer,
}

impl MockRegionServer {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn url(&self, request_path: &str) -> String {
        format!("{}{}", self.server.uri(), request_path)
    }

    fn endpoint(&self, code: &str, request_path: &str) -> Endpoint {
        Endpoint::new(code, format!("Mock {}", code), self.url(request_path))
    }

    async fn mock_status(&self, request_path: &str, status: u16, delay_ms: Option<u64>) {
        let mut template = ResponseTemplate::new(status).set_body_string("healthy: mock");
        if let Some(delay) = delay_ms {
            template = template.set_delay(Duration::from_millis(delay));
        }

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    async fn mock_redirect(&self, from_path: &str, to_path: &str) {
        Mock::given(method("GET"))
            .and(path(from_path))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", self.url(to_path).as_str()))
            .mount(&self.server)
            .await;
    }
}

fn network_logger() -> NetworkLogger {
    LoggerFactory::new(&Config::default()).create_network_logger()
}

fn latency_probe() -> HttpLatencyProbe {
    HttpLatencyProbe::new(network_logger()).unwrap()
}

fn tracing_probe() -> HttpTracingProbe {
    HttpTracingProbe::new(network_logger()).unwrap()
}

/// One-shot HTTPS server on 127.0.0.1 with a freshly generated certificate
struct TlsRegionServer {
    address: String,
    connector: TlsConnector,
    handle: JoinHandle<()>,
}

impl TlsRegionServer {
    /// Answer one GET after `delay`. Without `close_notify` the socket is
    /// dropped straight after the response is flushed.
    async fn start(delay: Duration, close_notify: bool) -> Self {
        let certified = rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string()]).unwrap();
        let cert = certified.cert.der().clone();
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));

        let server_config = ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_no_client_auth()
            .with_single_cert(vec![cert.clone()], key)
            .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        let mut roots = RootCertStore::empty();
        roots.add(cert).unwrap();
        let connector = TlsConnector::from(tls::client_config_with_roots(roots).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("https://127.0.0.1:{}/ping", listener.local_addr().unwrap().port());

        let handle = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            // Untrusting clients abort the handshake
            let Ok(mut stream) = acceptor.accept(tcp).await else {
                return;
            };

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            tokio::time::sleep(delay).await;
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\nConnection: close\r\n\r\nhealthy")
                .await
                .unwrap();
            if close_notify {
                stream.shutdown().await.unwrap();
            } else {
                stream.flush().await.unwrap();
            }
        });

        Self {
            address,
            connector,
            handle,
        }
    }

    fn tracer(&self) -> HttpTracingProbe {
        HttpTracingProbe::with_connector(self.connector.clone(), network_logger())
    }

    fn endpoint(&self, code: &str) -> Endpoint {
        Endpoint::new(code, format!("Secure {}", code), self.address.clone())
    }
}

/// Address on localhost that refuses connections
async fn refused_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/ping", port)
}

#[tokio::test]
async fn test_measure_success() {
    let server = MockRegionServer::new().await;
    server.mock_status("/ping", 200, None).await;

    let result = latency_probe().measure(&server.endpoint("us-east-1", "/ping")).await.unwrap();

    assert!(result.success);
    assert_eq!(result.status_code, Some(200));
    assert!(result.error.is_none());
    assert!(result.tier().is_some());
}

#[tokio::test]
async fn test_measure_non_200_is_failed_result() {
    let server = MockRegionServer::new().await;
    server.mock_status("/ping", 503, None).await;

    let result = latency_probe().measure(&server.endpoint("eu-west-1", "/ping")).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.status_code, Some(503));
    assert_eq!(result.tier(), None);
    assert_eq!(result.error.as_deref(), Some("Ping failed with status code: 503"));
}

#[tokio::test]
async fn test_measure_includes_server_delay() {
    let server = MockRegionServer::new().await;
    server.mock_status("/slow", 200, Some(250)).await;

    let result = latency_probe().measure(&server.endpoint("ap-south-1", "/slow")).await.unwrap();

    assert!(result.latency >= Duration::from_millis(250));
    assert_ne!(result.tier(), Some(Tier::Fast));
}

#[tokio::test]
async fn test_measure_follows_redirects() {
    let server = MockRegionServer::new().await;
    server.mock_redirect("/old", "/ping").await;
    server.mock_status("/ping", 200, None).await;

    let result = latency_probe().measure(&server.endpoint("us-west-2", "/old")).await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_measure_malformed_address() {
    let endpoint = Endpoint::new("bad", "Bad", "not a url");
    let error = latency_probe().measure(&endpoint).await.unwrap_err();
    assert_eq!(error.category(), "REQUEST");
    assert!(error.is_fatal());
}

#[tokio::test]
async fn test_measure_connection_refused_is_transport_error() {
    let endpoint = Endpoint::new("gone", "Gone", refused_address().await);
    let error = latency_probe().measure(&endpoint).await.unwrap_err();
    assert!(error.is_transport());
}

#[tokio::test]
async fn test_trace_plain_http_skips_dns_and_tls() {
    let server = MockRegionServer::new().await;
    server.mock_status("/ping", 200, Some(100)).await;

    let trace = tracing_probe().trace(&server.endpoint("us-east-1", "/ping")).await.unwrap();

    assert!(!trace.tls);
    assert_eq!(trace.dns_lookup, Duration::ZERO);
    assert_eq!(trace.name_lookup, Duration::ZERO);
    assert_eq!(trace.tls_handshake, Duration::ZERO);
    assert_eq!(trace.pre_transfer, trace.connect);
    assert!(trace.server_processing >= Duration::from_millis(100));
    assert!(trace.start_transfer <= trace.total);
}

#[tokio::test]
async fn test_trace_produced_for_non_200() {
    let server = MockRegionServer::new().await;
    server.mock_status("/ping", 503, None).await;

    let url = HttpUtils::parse_probe_url(&server.url("/ping")).unwrap();
    let mut recorder = CheckpointRecorder::new();
    let response = tracing_probe().exchange(&url, &mut recorder).await.unwrap();

    assert_eq!(response.status_code, 503);
    assert!(response.bytes > 0);
    assert!(recorder.fired(crate::models::Checkpoint::FirstByte));
    assert!(recorder.finish().is_ok());
}

#[tokio::test]
async fn test_trace_does_not_follow_redirects() {
    let server = MockRegionServer::new().await;
    server.mock_redirect("/old", "/ping").await;

    let url = HttpUtils::parse_probe_url(&server.url("/old")).unwrap();
    let mut recorder = CheckpointRecorder::new();
    let response = tracing_probe().exchange(&url, &mut recorder).await.unwrap();
    assert_eq!(response.status_code, 301);
}

#[tokio::test]
async fn test_trace_connection_refused_is_transport_error() {
    let endpoint = Endpoint::new("gone", "Gone", refused_address().await);
    let error = tracing_probe().trace(&endpoint).await.unwrap_err();
    assert!(error.is_transport());
}

#[tokio::test]
async fn test_trace_malformed_address() {
    let endpoint = Endpoint::new("bad", "Bad", "mailto:ops@example.com");
    let error = tracing_probe().trace(&endpoint).await.unwrap_err();
    assert_eq!(error.category(), "REQUEST");
}

#[tokio::test]
async fn test_trace_host_name_runs_dns_phase() {
    let server = MockRegionServer::new().await;
    server.mock_status("/ping", 200, None).await;

    let url = HttpUtils::parse_probe_url(&format!("http://localhost:{}/ping", server.server.address().port())).unwrap();
    let mut recorder = CheckpointRecorder::new();
    let response = tracing_probe().exchange(&url, &mut recorder).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert!(recorder.fired(Checkpoint::DnsStart));
    assert!(recorder.fired(Checkpoint::DnsDone));
    assert!(!recorder.fired(Checkpoint::TlsDone));

    let trace = recorder.finish().unwrap();
    assert!(!trace.tls);
    assert_eq!(trace.name_lookup, trace.dns_lookup);
    assert!(trace.connect >= trace.name_lookup);
    assert_eq!(trace.pre_transfer, trace.connect);
}

#[tokio::test]
async fn test_trace_https_records_handshake() {
    let server = TlsRegionServer::start(Duration::from_millis(50), true).await;

    let trace = server.tracer().trace(&server.endpoint("eu-north-1")).await.unwrap();
    server.handle.await.unwrap();

    assert!(trace.tls);
    assert_eq!(trace.dns_lookup, Duration::ZERO);
    assert!(trace.tls_handshake > Duration::ZERO);
    assert_eq!(trace.pre_transfer, trace.connect + trace.tls_handshake);
    assert!(trace.server_processing >= Duration::from_millis(50));
    assert!(trace.start_transfer <= trace.total);
}

#[tokio::test]
async fn test_trace_https_tolerates_missing_close_notify() {
    let server = TlsRegionServer::start(Duration::ZERO, false).await;

    let url = HttpUtils::parse_probe_url(&server.address).unwrap();
    let mut recorder = CheckpointRecorder::new();
    let response = server.tracer().exchange(&url, &mut recorder).await.unwrap();
    server.handle.await.unwrap();

    assert_eq!(response.status_code, 200);
    assert!(response.bytes > 0);
    assert!(recorder.fired(Checkpoint::TlsStart));
    assert!(recorder.fired(Checkpoint::TlsDone));
    assert!(recorder.fired(Checkpoint::ResponseComplete));
    assert!(recorder.finish().unwrap().tls);
}

#[tokio::test]
async fn test_trace_https_untrusted_certificate_is_transport_error() {
    let server = TlsRegionServer::start(Duration::ZERO, true).await;

    let error = tracing_probe().trace(&server.endpoint("eu-south-1")).await.unwrap_err();
    server.handle.await.unwrap();

    assert!(error.is_transport());
    assert!(error.to_string().contains("TLS handshake"));
}
