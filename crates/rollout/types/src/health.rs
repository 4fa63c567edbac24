//! Dependent service health

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a single health check against a dependent service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Service name as configured
    pub name: String,

    /// Whether the service answered with success in time
    pub healthy: bool,

    /// Round-trip latency of the check
    pub latency: Duration,

    /// Failure description when unhealthy
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn healthy(name: impl Into<String>, latency: Duration) -> Self {
        Self {
            name: name.into(),
            healthy: true,
            latency,
            error: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: false,
            latency: Duration::ZERO,
            error: Some(error.into()),
        }
    }
}
