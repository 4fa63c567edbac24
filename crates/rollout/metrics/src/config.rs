//! Collaborator endpoint configuration

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A dependent service that is health-checked before transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Display name
    pub name: String,

    /// Health URL; any 2xx response counts as healthy
    pub health_url: String,
}

impl ServiceEndpoint {
    pub fn new(name: impl Into<String>, health_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health_url: health_url.into(),
        }
    }
}

/// Endpoints and timeouts for the metrics client, health checker and switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Quality metrics endpoint of the governed component
    pub quality_url: String,

    /// Task statistics endpoint of the dependent orchestrator
    pub orchestrator_stats_url: String,

    /// Authority switch endpoint of the governed component
    pub switch_url: String,

    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,

    /// Per health check timeout (milliseconds)
    pub health_timeout_ms: u64,

    /// Retry policy for metrics and health fetches
    pub retry: RetryPolicy,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            quality_url: "http://127.0.0.1:8090/metrics/quality".to_string(),
            orchestrator_stats_url: "http://127.0.0.1:8080/api/stats".to_string(),
            switch_url: "http://127.0.0.1:8090/authority".to_string(),
            request_timeout_ms: 5000,
            health_timeout_ms: 5000,
            retry: RetryPolicy::default(),
        }
    }
}

impl MetricsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }
}
