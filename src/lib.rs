//! pingcloud
//!
//! Measures HTTP(S) latency to cloud provider regions. A sweep probes every
//! region of a provider and prints one tiered row per region; naming regions
//! produces an httpstat-style phase breakdown of one instrumented exchange
//! per region; ranking samples every region repeatedly and orders them by
//! median latency.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod registry;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use app::App;
pub use client::{HttpLatencyProbe, HttpTracingProbe, LatencyProbe, TracingProbe};
pub use error::{AppError, ErrorReporter, Result};
pub use models::{Checkpoint, CheckpointRecorder, Config, Endpoint, PhaseTrace, ProbeResult};
pub use registry::EndpointRegistry;
pub use types::{FailurePolicy, Provider, Tier};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Set by build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
pub const TARGET_TRIPLE: &str = env!("TARGET_TRIPLE");

/// One-line version banner for debug output
pub fn build_info() -> String {
    format!(
        "{} v{} ({}, {}, built {})",
        PKG_NAME, VERSION, GIT_COMMIT, TARGET_TRIPLE, BUILD_TIME
    )
}

/// Default configuration values
pub mod defaults {
    use crate::logging::{LogFormat, LogLevel};
    use std::time::Duration;

    /// Latencies below this are fast
    pub const FAST_TIER_BOUND: Duration = Duration::from_millis(200);
    /// Latencies at or above this are slow
    pub const SLOW_TIER_BOUND: Duration = Duration::from_millis(999);

    /// Fields per registry record: code, name, address
    pub const CSV_COLUMNS: usize = 3;

    /// Minimum padded width of every table column but the last
    pub const TABLE_MIN_WIDTH: usize = 40;
    pub const TABLE_PADDING: usize = 2;

    pub const DEFAULT_SAMPLES: u32 = 5;
    pub const MAX_SAMPLES: u32 = 100;
    pub const DEFAULT_CONCURRENCY: usize = 4;
    pub const MAX_CONCURRENCY: usize = 64;

    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Warn;
    pub const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Console;

    pub const USER_AGENT: &str = concat!("pingcloud/", env!("CARGO_PKG_VERSION"));
}
