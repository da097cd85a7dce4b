//! Latency probes: round-trip timing over reqwest and phase tracing over
//! the instrumented transport

pub mod tls;
pub mod trace;

#[cfg(test)]
pub(crate) mod fakes;
#[cfg(test)]
mod integration_tests;

pub use trace::{HttpTracingProbe, TracedResponse};

use crate::{
    error::{AppError, Result},
    logging::NetworkLogger,
    models::{Endpoint, PhaseTrace, ProbeResult},
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Instant;

/// Measures the round trip of one GET to an endpoint
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Any HTTP response, whatever its status, is `Ok`. Request construction
    /// and transport failures are `Err`; the caller decides whether they
    /// end the run.
    async fn measure(&self, endpoint: &Endpoint) -> Result<ProbeResult>;
}

/// Breaks one GET to an endpoint down into lifecycle phases
#[async_trait]
pub trait TracingProbe: Send + Sync {
    async fn trace(&self, endpoint: &Endpoint) -> Result<PhaseTrace>;
}

/// LatencyProbe backed by reqwest. No timeout, default redirect policy.
pub struct HttpLatencyProbe {
    client: Client,
    logger: NetworkLogger,
}

impl HttpLatencyProbe {
    pub fn new(logger: NetworkLogger) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::defaults::USER_AGENT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, logger })
    }
}

#[async_trait]
impl LatencyProbe for HttpLatencyProbe {
    async fn measure(&self, endpoint: &Endpoint) -> Result<ProbeResult> {
        let url = HttpUtils::parse_probe_url(&endpoint.address)?;

        let start = Instant::now();
        // send() resolves once the status line and headers are in
        let response = self.client.get(url.clone()).send().await;
        let latency = start.elapsed();
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.logger.log_http_request(url.as_str(), "GET", None, latency_ms).await;
                return Err(AppError::from(e));
            }
        };

        let status_code = response.status().as_u16();
        self.logger
            .log_http_request(url.as_str(), "GET", Some(status_code), latency_ms)
            .await;

        let result = if status_code == 200 {
            ProbeResult::success(endpoint.clone(), latency)
        } else {
            ProbeResult::bad_status(endpoint.clone(), status_code, latency)
        };

        self.logger
            .logger()
            .debug(&format!("Measured region {}", endpoint.code))
            .probe(&result)
            .log()
            .await;

        Ok(result)
    }
}

/// URL helpers shared by both probes
pub struct HttpUtils;

impl HttpUtils {
    /// Parse an endpoint address into an absolute http(s) URL with a host
    pub fn parse_probe_url(address: &str) -> Result<Url> {
        let url = Url::parse(address.trim())?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::request_construction(format!(
                    "Unsupported URL scheme '{}' in {}",
                    scheme, address
                )))
            }
        }

        if url.host().is_none() {
            return Err(AppError::request_construction(format!("URL must have a host: {}", address)));
        }

        Ok(url)
    }

    pub fn is_https(url: &Url) -> bool {
        url.scheme() == "https"
    }
}
