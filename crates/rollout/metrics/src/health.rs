//! Dependent service health checks

use crate::config::{MetricsConfig, ServiceEndpoint};
use crate::error::{MetricsError, MetricsResult};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use rollout_types::ServiceHealth;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Health checker for dependent services
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Check a single service. Failures are reported, never raised.
    async fn check(&self, service: &ServiceEndpoint) -> ServiceHealth;

    /// Check all services concurrently, preserving order.
    async fn check_all(&self, services: &[ServiceEndpoint]) -> Vec<ServiceHealth> {
        join_all(services.iter().map(|s| self.check(s))).await
    }
}

/// HTTP health checker: GET the health URL, any 2xx is healthy
pub struct HttpHealthChecker {
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpHealthChecker {
    pub fn new(config: &MetricsConfig) -> MetricsResult<Self> {
        let client = Client::builder().timeout(config.health_timeout()).build()?;

        Ok(Self {
            client,
            timeout: config.health_timeout(),
            retry: config.retry.clone(),
        })
    }

    async fn probe(&self, url: &str) -> MetricsResult<()> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| MetricsError::Timeout(url.to_string()))??;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(MetricsError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            })
        }
    }
}

#[async_trait]
impl HealthChecker for HttpHealthChecker {
    #[instrument(skip(self, service), fields(service = %service.name))]
    async fn check(&self, service: &ServiceEndpoint) -> ServiceHealth {
        let start = Instant::now();
        let result = self
            .retry
            .run("health_check", || self.probe(&service.health_url))
            .await;

        match result {
            Ok(()) => {
                let latency = start.elapsed();
                debug!(latency_ms = latency.as_millis() as u64, "Service healthy");
                ServiceHealth::healthy(&service.name, latency)
            }
            Err(e) => {
                warn!(error = %e, "Service unhealthy");
                ServiceHealth::unhealthy(&service.name, e.to_string())
            }
        }
    }
}
