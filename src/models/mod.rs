//! Data models for pingcloud

pub mod config;
pub mod endpoint;
pub mod metrics;

// Re-export main model types
pub use config::Config;
pub use endpoint::Endpoint;
pub use metrics::{Checkpoint, CheckpointRecorder, PhaseTrace, ProbeResult};
