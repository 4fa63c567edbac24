//! Transition controller configuration

use rollout_metrics::ServiceEndpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the transition controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Failed or in-flight attempts allowed before an operator reset
    pub max_transition_attempts: u32,

    /// Wait between applying a level and the post-transition check (seconds)
    pub settle_period_secs: u64,

    /// Largest tolerated post-transition quality drop (percentage points)
    pub quality_regression_threshold: f64,

    /// Coherence required before promoting to full
    pub coherence_floor: f64,

    /// Dependent orchestrator health-checked before every transition
    pub orchestrator: Option<ServiceEndpoint>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_transition_attempts: 3,
            settle_period_secs: 30,
            quality_regression_threshold: 10.0,
            coherence_floor: 0.70,
            orchestrator: None,
        }
    }
}

impl ControllerConfig {
    pub fn settle_period(&self) -> Duration {
        Duration::from_secs(self.settle_period_secs)
    }
}
