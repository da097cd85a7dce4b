//! Host name resolution for the tracing transport

use crate::error::{AppError, Result};
use std::net::IpAddr;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};

/// Where the resolver configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverSource {
    /// Host system configuration (resolv.conf or the platform equivalent)
    System,
    /// Resolver defaults, used when no system configuration is readable
    Fallback,
}

/// Resolver following the host system's DNS configuration
#[derive(Clone)]
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
    source: ResolverSource,
}

impl SystemResolver {
    /// Create a resolver from the system configuration, falling back to
    /// the resolver defaults when it cannot be read
    pub fn new() -> Self {
        match system_conf::read_system_conf() {
            Ok((config, opts)) => Self::with_config(config, opts, ResolverSource::System),
            Err(_) => Self::with_config(ResolverConfig::default(), ResolverOpts::default(), ResolverSource::Fallback),
        }
    }

    pub fn with_config(config: ResolverConfig, opts: ResolverOpts, source: ResolverSource) -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            source,
        }
    }

    pub fn source(&self) -> ResolverSource {
        self.source
    }

    /// Resolve a host name. IP literals are returned as-is without a query.
    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Some(ip) = ip_literal(host) {
            return Ok(vec![ip]);
        }

        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::transport(format!("DNS lookup failed for {}: {}", host, e)))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(AppError::transport(format!("DNS lookup for {} returned no addresses", host)));
        }
        Ok(ips)
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a host that is already an address, with or without IPv6 brackets
pub fn ip_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[').trim_end_matches(']').parse().ok()
}
