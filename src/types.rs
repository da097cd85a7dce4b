//! Type definitions and aliases

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Cloud providers with a region registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Gcp,
    Azure,
}

impl Provider {
    /// Sub-command name and CSV file stem
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
            Provider::Azure => "azure",
        }
    }

    /// Label used in listing headers
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS",
            Provider::Gcp => "GCP",
            Provider::Azure => "Azure",
        }
    }

    /// Region used in the "trace a single region" hint
    pub fn example_region(&self) -> &'static str {
        match self {
            Provider::Aws => "us-east-1",
            Provider::Gcp => "us-central1",
            Provider::Azure => "koreasouth",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            "azure" => Ok(Provider::Azure),
            other => Err(AppError::parse(format!("Unknown provider: {}", other))),
        }
    }
}

/// Latency severity bucket for single-value reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Below the fast bound (< 200ms)
    Fast,
    /// From the fast bound up to, not including, the slow bound (200ms..999ms)
    Moderate,
    /// At or above the slow bound (>= 999ms)
    Slow,
}

impl Tier {
    /// Classify a round-trip latency. Lower bounds are inclusive.
    pub fn classify(latency: Duration) -> Self {
        if latency < crate::defaults::FAST_TIER_BOUND {
            Self::Fast
        } else if latency < crate::defaults::SLOW_TIER_BOUND {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Moderate => "moderate",
            Self::Slow => "slow",
        }
    }
}

/// What the batch driver does when a probe fails at the transport level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run and surface the error
    #[default]
    Abort,
    /// Print an inline failure row and move on to the next endpoint
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" | "strict" => Ok(Self::Abort),
            "continue" | "lenient" => Ok(Self::Continue),
            other => Err(AppError::parse(format!("Invalid failure policy: {}", other))),
        }
    }
}
