//! Region endpoint model

use serde::{Deserialize, Serialize};

/// A network-reachable address used to measure latency to one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Region code, unique within a registry (e.g. `us-east-1`)
    pub code: String,
    /// Human-readable region name
    pub name: String,
    /// Absolute http(s) URL that is probed
    pub address: String,
}

impl Endpoint {
    pub fn new<C, N, A>(code: C, name: N, address: A) -> Self
    where
        C: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            code: code.into(),
            name: name.into(),
            address: address.into(),
        }
    }
}
