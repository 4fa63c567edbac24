//! Metrics source trait and HTTP client

use crate::config::MetricsConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use rollout_types::MetricsSnapshot;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Source of point-in-time telemetry
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch a fresh snapshot
    async fn fetch(&self) -> MetricsResult<MetricsSnapshot>;
}

/// Quality endpoint payload
#[derive(Debug, Deserialize)]
struct QualityResponse {
    #[serde(default)]
    quality: f64,
    #[serde(default)]
    coherence: f64,
    #[serde(default)]
    precision: f64,
}

/// Orchestrator stats payload
#[derive(Debug, Deserialize)]
struct OrchestratorStats {
    #[serde(default)]
    completed_tasks: u64,
    #[serde(default)]
    failed_tasks: u64,
    #[serde(default)]
    failure_rate: Option<f64>,
    #[serde(default)]
    success_rate: Option<f64>,
    #[serde(default)]
    avg_execution_ms: f64,
}

/// HTTP metrics client reading the quality and orchestrator endpoints
pub struct HttpMetricsClient {
    client: Client,
    quality_url: String,
    stats_url: String,
    retry: RetryPolicy,
}

impl HttpMetricsClient {
    /// Create a new metrics client
    pub fn new(config: &MetricsConfig) -> MetricsResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            quality_url: config.quality_url.clone(),
            stats_url: config.orchestrator_stats_url.clone(),
            retry: config.retry.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> MetricsResult<T> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MetricsError::Timeout(url.to_string())
            } else {
                MetricsError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MetricsError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MetricsError::InvalidResponse {
                endpoint: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn ratio(value: f64, field: &str, endpoint: &str) -> MetricsResult<f64> {
        if !value.is_finite() {
            return Err(MetricsError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: format!("{} is not a finite number", field),
            });
        }
        Ok(value.clamp(0.0, 1.0))
    }

    fn combine(&self, quality: QualityResponse, stats: OrchestratorStats) -> MetricsResult<MetricsSnapshot> {
        let failure_rate = match stats.failure_rate {
            Some(rate) => Self::ratio(rate, "failure_rate", &self.stats_url)?,
            None => MetricsSnapshot::derived_failure_rate(stats.completed_tasks, stats.failed_tasks),
        };
        let dependent_success_rate = match stats.success_rate {
            Some(rate) => Self::ratio(rate, "success_rate", &self.stats_url)?,
            None => 1.0 - failure_rate,
        };

        Ok(MetricsSnapshot {
            quality: Self::ratio(quality.quality, "quality", &self.quality_url)?,
            coherence: Self::ratio(quality.coherence, "coherence", &self.quality_url)?,
            precision: Self::ratio(quality.precision, "precision", &self.quality_url)?,
            dependent_success_rate,
            completed_tasks: stats.completed_tasks,
            failed_tasks: stats.failed_tasks,
            failure_rate,
            avg_execution_ms: stats.avg_execution_ms,
            collected_at: chrono::Utc::now(),
        })
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsClient {
    #[instrument(skip(self))]
    async fn fetch(&self) -> MetricsResult<MetricsSnapshot> {
        let (quality, stats) = futures::join!(
            self.retry
                .run("quality_metrics", || self.get_json::<QualityResponse>(&self.quality_url)),
            self.retry
                .run("orchestrator_stats", || self.get_json::<OrchestratorStats>(&self.stats_url)),
        );

        let snapshot = self.combine(quality?, stats?)?;
        debug!(
            quality = snapshot.quality,
            success_rate = snapshot.dependent_success_rate,
            completed = snapshot.completed_tasks,
            "Fetched metrics snapshot"
        );
        Ok(snapshot)
    }
}
