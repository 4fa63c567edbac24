//! Per-level readiness gate
//!
//! A narrow, pure check used by the transition controller and the trend
//! monitor. The six-stage report is for humans; this is what actually
//! blocks a promotion.

use rollout_types::{AuthorityLevel, MetricsSnapshot, ReadinessGate};
use serde::{Deserialize, Serialize};

/// Numeric requirements for entering a level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRequirements {
    pub min_quality: f64,
    pub min_success_rate: f64,
    pub min_completed_tasks: u64,
    pub max_failure_rate: f64,
    /// Store must answer its health probe
    pub require_store_healthy: bool,
    /// Attempt counter must be below the controller's cap
    pub enforce_attempt_cap: bool,
}

impl LevelRequirements {
    /// Requirements for `level`; `None` when the level has none.
    pub fn for_level(level: AuthorityLevel) -> Option<Self> {
        match level {
            AuthorityLevel::Observing => None,
            AuthorityLevel::Partial => Some(Self {
                min_quality: 0.25,
                min_success_rate: 0.80,
                min_completed_tasks: 10,
                max_failure_rate: 0.10,
                require_store_healthy: false,
                enforce_attempt_cap: false,
            }),
            AuthorityLevel::Full => Some(Self {
                min_quality: 0.75,
                min_success_rate: 0.95,
                min_completed_tasks: 25,
                max_failure_rate: 0.05,
                require_store_healthy: true,
                enforce_attempt_cap: true,
            }),
        }
    }

    /// Quality threshold for `level`, zero when unconstrained.
    pub fn quality_threshold(level: AuthorityLevel) -> f64 {
        Self::for_level(level).map_or(0.0, |r| r.min_quality)
    }
}

/// Non-metric inputs to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateContext {
    pub store_healthy: bool,
    pub transition_attempts: u32,
    pub max_attempts: u32,
}

fn pct(value: f64) -> f64 {
    value * 100.0
}

/// Evaluate whether the system may enter `target` given `metrics`.
pub fn evaluate_transition_readiness(
    metrics: &MetricsSnapshot,
    target: AuthorityLevel,
    ctx: &GateContext,
) -> ReadinessGate {
    let Some(req) = LevelRequirements::for_level(target) else {
        return ReadinessGate::from_blockers(Vec::new());
    };

    let mut blockers = Vec::new();

    if metrics.quality < req.min_quality {
        blockers.push(format!(
            "Quality score {:.1}% is below the {:.0}% required for {}",
            pct(metrics.quality),
            pct(req.min_quality),
            target
        ));
    }

    if metrics.dependent_success_rate < req.min_success_rate {
        blockers.push(format!(
            "Dependent service success rate {:.1}% is below the {:.0}% required for {}",
            pct(metrics.dependent_success_rate),
            pct(req.min_success_rate),
            target
        ));
    }

    if metrics.completed_tasks < req.min_completed_tasks {
        blockers.push(format!(
            "Completed tasks {} is below the {} required for {}",
            metrics.completed_tasks, req.min_completed_tasks, target
        ));
    }

    if metrics.failure_rate > req.max_failure_rate {
        blockers.push(format!(
            "Failure rate {:.1}% exceeds the {:.0}% allowed for {}",
            pct(metrics.failure_rate),
            pct(req.max_failure_rate),
            target
        ));
    }

    if req.require_store_healthy && !ctx.store_healthy {
        blockers.push(format!("Mode state store is not healthy, required for {}", target));
    }

    if req.enforce_attempt_cap && ctx.transition_attempts >= ctx.max_attempts {
        blockers.push(format!(
            "Transition attempts {} have reached the limit of {}",
            ctx.transition_attempts, ctx.max_attempts
        ));
    }

    ReadinessGate::from_blockers(blockers)
}
