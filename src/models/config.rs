//! Configuration data model and validation

use crate::{
    logging::{LogFormat, LogLevel},
    types::{AppError, FailurePolicy, Provider, Result},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider whose registry is used
    #[serde(default = "default_provider")]
    pub provider: Provider,

    /// Region codes to trace, in argument order
    #[serde(default)]
    pub regions: Vec<String>,

    /// Print the registry instead of probing
    #[serde(default)]
    pub list: bool,

    /// Explicit registry CSV file
    #[serde(default)]
    pub endpoints_file: Option<PathBuf>,

    /// Root directory holding `endpoints/<provider>.csv`
    #[serde(default)]
    pub endpoints_dir: Option<PathBuf>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// What a sweep or trace batch does on a transport failure
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Rank every region by median latency
    #[serde(default)]
    pub rank: bool,

    /// Samples per region when ranking
    #[serde(default = "default_samples")]
    pub samples: u32,

    /// Probes in flight when ranking
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            regions: Vec::new(),
            list: false,
            endpoints_file: None,
            endpoints_dir: None,
            enable_color: default_enable_color(),
            debug: false,
            log_level: default_log_level(),
            log_format: default_log_format(),
            failure_policy: FailurePolicy::default(),
            rank: false,
            samples: default_samples(),
            concurrency: default_concurrency(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 || self.samples > crate::defaults::MAX_SAMPLES {
            return Err(AppError::config(format!(
                "Samples must be between 1 and {}, got: {}",
                crate::defaults::MAX_SAMPLES,
                self.samples
            )));
        }

        if self.concurrency == 0 || self.concurrency > crate::defaults::MAX_CONCURRENCY {
            return Err(AppError::config(format!(
                "Concurrency must be between 1 and {}, got: {}",
                crate::defaults::MAX_CONCURRENCY,
                self.concurrency
            )));
        }

        if self.rank && !self.regions.is_empty() {
            return Err(AppError::config("--rank covers every region and cannot be combined with region codes"));
        }

        if self.rank && self.list {
            return Err(AppError::config("--rank cannot be combined with --list"));
        }

        if let Some(path) = &self.endpoints_file {
            if path.as_os_str().is_empty() {
                return Err(AppError::config("Endpoints file path cannot be empty"));
            }
        }

        Ok(())
    }

    /// Merge process environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_vars(|key| std::env::var(key).ok())
    }

    /// Merge variables from any lookup. Empty values count as unset.
    pub fn merge_from_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = var("PINGCLOUD_DIR") {
            self.endpoints_dir = Some(PathBuf::from(dir));
        }

        if let Some(file) = var("PINGCLOUD_ENDPOINTS") {
            self.endpoints_file = Some(PathBuf::from(file));
        }

        if let Some(enable_color) = var("ENABLE_COLOR") {
            self.enable_color = enable_color
                .parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        // https://no-color.org: any non-empty value disables color
        if var("NO_COLOR").is_some() {
            self.enable_color = false;
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level
                .parse()
                .map_err(|e| AppError::config(format!("Invalid LOG_LEVEL value '{}': {}", level, e)))?;
        }

        if let Some(format) = var("LOG_FORMAT") {
            self.log_format = format
                .parse()
                .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", format, e)))?;
        }

        if let Some(policy) = var("PINGCLOUD_FAILURE_POLICY") {
            self.failure_policy = policy.parse().map_err(|e| {
                AppError::config(format!("Invalid PINGCLOUD_FAILURE_POLICY value '{}': {}", policy, e))
            })?;
        }

        if let Some(samples) = var("PINGCLOUD_SAMPLES") {
            self.samples = samples
                .parse()
                .map_err(|e| AppError::config(format!("Invalid PINGCLOUD_SAMPLES value '{}': {}", samples, e)))?;
        }

        if let Some(concurrency) = var("PINGCLOUD_CONCURRENCY") {
            self.concurrency = concurrency.parse().map_err(|e| {
                AppError::config(format!("Invalid PINGCLOUD_CONCURRENCY value '{}': {}", concurrency, e))
            })?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_provider() -> Provider {
    Provider::Aws
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_log_level() -> LogLevel {
    crate::defaults::DEFAULT_LOG_LEVEL
}

fn default_log_format() -> LogFormat {
    crate::defaults::DEFAULT_LOG_FORMAT
}

fn default_samples() -> u32 {
    crate::defaults::DEFAULT_SAMPLES
}

fn default_concurrency() -> usize {
    crate::defaults::DEFAULT_CONCURRENCY
}
