//! Readiness validation configuration.
//!
//! Thresholds for the six-stage report and the dependent services it probes.

use rollout_metrics::ServiceEndpoint;
use serde::{Deserialize, Serialize};

/// Configuration for the readiness validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Quality required by the quality stage (0.0-1.0).
    pub min_quality: f64,

    /// Coherence required by the quality stage.
    pub min_coherence: f64,

    /// Precision required by the quality stage.
    pub min_precision: f64,

    /// Ceiling on average store probe latency (milliseconds).
    pub max_store_latency_ms: f64,

    /// Number of store probes averaged by the performance stage.
    pub latency_probes: u32,

    /// Dependent orchestrator success rate required.
    pub required_success_rate: f64,

    /// Minimum number of tables expected in the store.
    pub min_table_count: usize,

    /// Completed tasks required by the task processing stage.
    pub min_completed_tasks: u64,

    /// Highest acceptable task failure rate.
    pub max_failure_rate: f64,

    /// Ceiling on average task execution time (milliseconds).
    pub max_avg_execution_ms: f64,

    /// Dependent services health-checked by the service health stage.
    pub services: Vec<ServiceEndpoint>,

    /// Enforcement/audit dependency checked by the security stage.
    pub audit_service: Option<ServiceEndpoint>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_quality: 0.75,
            min_coherence: 0.70,
            min_precision: 0.80,
            max_store_latency_ms: 100.0,
            latency_probes: 3,
            required_success_rate: 0.95,
            min_table_count: 4,
            min_completed_tasks: 25,
            max_failure_rate: 0.05,
            max_avg_execution_ms: 30_000.0,
            services: Vec::new(),
            audit_service: None,
        }
    }
}
