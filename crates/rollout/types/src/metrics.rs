//! Telemetry types consumed by the gates and the trend monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time telemetry for the governed component and its dependencies.
///
/// Ratios are in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub quality: f64,
    pub coherence: f64,
    pub precision: f64,
    /// Success rate reported by the dependent orchestrator
    pub dependent_success_rate: f64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub failure_rate: f64,
    /// Mean task execution time in milliseconds
    pub avg_execution_ms: f64,
    pub collected_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Failure rate derived from task counters, zero when nothing ran.
    pub fn derived_failure_rate(completed: u64, failed: u64) -> f64 {
        let total = completed + failed;
        if total == 0 {
            0.0
        } else {
            failed as f64 / total as f64
        }
    }

    /// Quality sample view of this snapshot.
    pub fn to_sample(&self) -> QualitySample {
        QualitySample {
            timestamp: self.collected_at,
            quality: self.quality,
            coherence: self.coherence,
            precision: self.precision,
            dependent_service_success_rate: self.dependent_success_rate,
        }
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            quality: 0.0,
            coherence: 0.0,
            precision: 0.0,
            dependent_success_rate: 0.0,
            completed_tasks: 0,
            failed_tasks: 0,
            failure_rate: 0.0,
            avg_execution_ms: 0.0,
            collected_at: Utc::now(),
        }
    }
}

/// One quality reading retained by the trend monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub timestamp: DateTime<Utc>,
    pub quality: f64,
    pub coherence: f64,
    pub precision: f64,
    pub dependent_service_success_rate: f64,
}

impl QualitySample {
    pub fn with_quality(timestamp: DateTime<Utc>, quality: f64) -> Self {
        Self {
            timestamp,
            quality,
            coherence: 0.0,
            precision: 0.0,
            dependent_service_success_rate: 0.0,
        }
    }
}
