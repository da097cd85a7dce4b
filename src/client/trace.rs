//! Instrumented HTTP(S) transport that records lifecycle checkpoints
//!
//! The exchange is driven step by step over a tokio `TcpStream` (wrapped in
//! tokio-rustls for https) so every phase boundary can be stamped as it
//! happens. One request is in flight per trace and checkpoints are recorded
//! inline, in causal order, by the task driving it.

use crate::{
    client::{tls, HttpUtils, TracingProbe},
    dns::SystemResolver,
    error::{AppError, Result},
    logging::{LogLevel, NetworkLogger},
    models::{Checkpoint, CheckpointRecorder, Endpoint, PhaseTrace},
};
use async_trait::async_trait;
use std::{
    io,
    net::SocketAddr,
    time::Instant,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::TlsConnector;
use url::{Host, Url};

const READ_CHUNK: usize = 8192;
/// Bytes of the response kept for status line parsing
const HEAD_LIMIT: usize = 16 * 1024;

trait Io: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// Status line and size of a traced response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedResponse {
    pub status_code: u16,
    pub bytes: usize,
}

/// TracingProbe over the instrumented transport
pub struct HttpTracingProbe {
    resolver: SystemResolver,
    connector: TlsConnector,
    logger: NetworkLogger,
}

impl HttpTracingProbe {
    pub fn new(logger: NetworkLogger) -> Result<Self> {
        Ok(Self {
            resolver: SystemResolver::new(),
            connector: tls::connector()?,
            logger,
        })
    }

    /// Trust whatever `connector` trusts instead of the webpki roots
    pub fn with_connector(connector: TlsConnector, logger: NetworkLogger) -> Self {
        Self {
            resolver: SystemResolver::new(),
            connector,
            logger,
        }
    }

    /// Run one exchange against `url`, stamping checkpoints into `recorder`
    pub async fn exchange(&self, url: &Url, recorder: &mut CheckpointRecorder) -> Result<TracedResponse> {
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AppError::request_construction(format!("No port known for {}", url)))?;

        let (host, addrs) = match url.host() {
            Some(Host::Ipv4(ip)) => (ip.to_string(), vec![SocketAddr::new(ip.into(), port)]),
            Some(Host::Ipv6(ip)) => (ip.to_string(), vec![SocketAddr::new(ip.into(), port)]),
            Some(Host::Domain(name)) => {
                let addrs = self.lookup(name, port, recorder).await?;
                (name.to_string(), addrs)
            }
            None => return Err(AppError::request_construction(format!("URL has no host: {}", url))),
        };

        recorder.record_now(Checkpoint::ConnectStart);
        let tcp = self.connect(&addrs).await?;
        let connected = Instant::now();
        recorder.record(Checkpoint::ConnectDone, connected);
        // Disable Nagle so the request head is not held back
        if let Err(e) = tcp.set_nodelay(true) {
            self.logger
                .logger()
                .debug(&format!("Could not disable Nagle for {}: {}", host, e))
                .field("host", &host)
                .log()
                .await;
        }

        let mut stream: Box<dyn Io> = if HttpUtils::is_https(url) {
            let server_name = tls::server_name(&host)?;
            // The handshake starts on the connected socket
            recorder.record(Checkpoint::TlsStart, connected);
            let tls_stream = self
                .connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| AppError::transport(format!("TLS handshake with {} failed: {}", host, e)))?;
            recorder.record_now(Checkpoint::TlsDone);
            Box::new(tls_stream)
        } else {
            Box::new(tcp)
        };

        let head = request_head(url);
        stream
            .write_all(head.as_bytes())
            .await
            .map_err(transport("writing request to", &host))?;
        stream.flush().await.map_err(transport("writing request to", &host))?;
        recorder.record_now(Checkpoint::WroteRequest);

        let mut chunk = vec![0u8; READ_CHUNK];
        let first = stream
            .read(&mut chunk)
            .await
            .map_err(transport("reading response from", &host))?;
        if first == 0 {
            return Err(AppError::transport(format!(
                "{} closed the connection before responding",
                host
            )));
        }
        recorder.record_now(Checkpoint::FirstByte);

        let mut response_head = chunk[..first].to_vec();
        let mut bytes = first;
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    bytes += n;
                    if response_head.len() < HEAD_LIMIT {
                        response_head.extend_from_slice(&chunk[..n]);
                    }
                }
                // TLS peers that close without close_notify once data has arrived
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(transport("reading response from", &host)(e)),
            }
        }
        recorder.record_now(Checkpoint::ResponseComplete);

        let status_code = parse_status_line(&response_head)?;
        Ok(TracedResponse { status_code, bytes })
    }

    async fn lookup(&self, name: &str, port: u16, recorder: &mut CheckpointRecorder) -> Result<Vec<SocketAddr>> {
        recorder.record_now(Checkpoint::DnsStart);
        let started = Instant::now();
        let result = self.resolver.resolve(name).await;
        recorder.record_now(Checkpoint::DnsDone);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let found = result.as_ref().map(Vec::len).unwrap_or(0);
        self.logger
            .log_dns_resolution(name, result.is_ok(), elapsed_ms, found)
            .await;

        Ok(result?.into_iter().map(|ip| SocketAddr::new(ip, port)).collect())
    }

    /// One debug entry per checkpoint, offset from the first one
    async fn log_checkpoints(&self, region: &str, recorder: &CheckpointRecorder) {
        let logger = self.logger.logger();
        if !logger.would_log(LogLevel::Debug) {
            return;
        }

        let Some(origin) = Checkpoint::ALL.iter().find_map(|kind| recorder.get(*kind)) else {
            return;
        };

        for kind in Checkpoint::ALL {
            let Some(at) = recorder.get(kind) else {
                continue;
            };
            let offset_ms = at.saturating_duration_since(origin).as_secs_f64() * 1000.0;
            logger
                .debug(&format!("{} {} at +{:.3}ms", region, kind.as_str(), offset_ms))
                .field("checkpoint", kind.as_str())
                .field("fired", recorder.fired(kind))
                .field("offset_ms", offset_ms)
                .log()
                .await;
        }
    }

    /// Connect to the first address that accepts
    async fn connect(&self, addrs: &[SocketAddr]) -> Result<TcpStream> {
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    self.logger.log_connection(&addr.to_string(), true, None).await;
                    return Ok(stream);
                }
                Err(e) => {
                    self.logger
                        .log_connection(&addr.to_string(), false, Some(&e.to_string()))
                        .await;
                    last_error = Some(format!("{}: {}", addr, e));
                }
            }
        }

        Err(AppError::transport(format!(
            "Connection failed: {}",
            last_error.unwrap_or_else(|| "no addresses to connect to".to_string())
        )))
    }
}

#[async_trait]
impl TracingProbe for HttpTracingProbe {
    async fn trace(&self, endpoint: &Endpoint) -> Result<PhaseTrace> {
        let url = HttpUtils::parse_probe_url(&endpoint.address)?;
        let mut recorder = CheckpointRecorder::new();

        let response = self.exchange(&url, &mut recorder).await?;
        self.log_checkpoints(&endpoint.code, &recorder).await;
        let trace = recorder.finish()?;

        let total_ms = trace.total.as_secs_f64() * 1000.0;
        self.logger
            .log_http_request(url.as_str(), "GET", Some(response.status_code), total_ms)
            .await;
        self.logger
            .logger()
            .debug(&format!("Traced region {}", endpoint.code))
            .field("region", &endpoint.code)
            .field("response_bytes", response.bytes)
            .phases(&trace)
            .log()
            .await;

        Ok(trace)
    }
}

/// Request head for a GET of `url` that asks the server to close afterwards
pub fn request_head(url: &Url) -> String {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: {}\r\nAccept: */*\r\nConnection: close\r\n\r\n",
        target,
        host,
        crate::defaults::USER_AGENT
    )
}

/// Status code from the first line of a response
pub fn parse_status_line(response: &[u8]) -> Result<u16> {
    let text = String::from_utf8_lossy(response);
    let line = text.lines().next().unwrap_or_default();
    let mut parts = line.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .map_err(|_| AppError::transport(format!("Malformed status line: {}", line))),
        _ => Err(AppError::transport(format!("Malformed status line: {}", line))),
    }
}

fn transport<'a>(action: &'a str, host: &'a str) -> impl Fn(io::Error) -> AppError + 'a {
    move |e| AppError::transport(format!("Error {} {}: {}", action, host, e))
}
