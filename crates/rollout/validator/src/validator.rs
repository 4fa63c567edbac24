//! Readiness validator: runs the six stages and aggregates the report.

use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rollout_metrics::{HealthChecker, MetricsSource};
use rollout_store::RolloutStore;
use rollout_types::{
    AuthorityLevel, IssueSeverity, MetricsSnapshot, OverallStatus, ReadinessGate,
    ReadinessReport, StageStatus, ValidationStageResult,
};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ValidatorConfig;
use crate::error::ValidationResult;
use crate::gate::{evaluate_transition_readiness, GateContext};
use crate::stages::{self, STAGE_WEIGHTS};

/// Minimum weighted score for `Ready`
pub const READY_SCORE: f64 = 75.0;
/// Minimum weighted score for `NeedsImprovement`
pub const IMPROVEMENT_SCORE: f64 = 50.0;

/// Runs readiness validation against live collaborators.
pub struct ReadinessValidator {
    config: ValidatorConfig,
    metrics: Arc<dyn MetricsSource>,
    health: Arc<dyn HealthChecker>,
    store: Arc<dyn RolloutStore>,
}

impl ReadinessValidator {
    pub fn new(
        config: ValidatorConfig,
        metrics: Arc<dyn MetricsSource>,
        health: Arc<dyn HealthChecker>,
        store: Arc<dyn RolloutStore>,
    ) -> Self {
        Self {
            config,
            metrics,
            health,
            store,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run all six stages concurrently and aggregate a report.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> ReadinessReport {
        let config = &self.config;
        let metrics = self.metrics.as_ref();
        let health = self.health.as_ref();
        let store = self.store.as_ref();

        let (quality, performance, data_integrity, service_health, task_processing, security) = futures::join!(
            isolated(stages::QUALITY, stages::quality(config, metrics)),
            isolated(stages::PERFORMANCE, stages::performance(config, metrics, store)),
            isolated(stages::DATA_INTEGRITY, stages::data_integrity(config, store)),
            isolated(stages::SERVICE_HEALTH, stages::service_health(config, health)),
            isolated(stages::TASK_PROCESSING, stages::task_processing(config, metrics)),
            isolated(stages::SECURITY, stages::security(config, health, store)),
        );

        let report = aggregate(vec![
            quality,
            performance,
            data_integrity,
            service_health,
            task_processing,
            security,
        ]);

        info!(
            status = %report.overall_status,
            score = report.readiness_score,
            critical = report.critical_issues.len(),
            warnings = report.warnings.len(),
            "Readiness validation complete"
        );
        report
    }

    /// Fetch metrics and store health, then evaluate the gate for `target`.
    #[instrument(skip(self))]
    pub async fn check_readiness(
        &self,
        target: AuthorityLevel,
        transition_attempts: u32,
        max_attempts: u32,
    ) -> ValidationResult<(MetricsSnapshot, ReadinessGate)> {
        let metrics = self.metrics.fetch().await?;
        let store_healthy = self.store.health_check().await.is_ok();

        let gate = evaluate_transition_readiness(
            &metrics,
            target,
            &GateContext {
                store_healthy,
                transition_attempts,
                max_attempts,
            },
        );
        debug!(ready = gate.ready, blockers = gate.blockers.len(), "Gate evaluated");
        Ok((metrics, gate))
    }
}

/// Run a stage, turning errors and panics into an `Error` result.
async fn isolated<F>(name: &'static str, stage: F) -> ValidationStageResult
where
    F: Future<Output = ValidationResult<ValidationStageResult>>,
{
    match AssertUnwindSafe(stage).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(stage = name, error = %e, "Validation stage failed");
            ValidationStageResult::errored(name, e.to_string())
        }
        Err(_) => {
            error!(stage = name, "Validation stage panicked");
            ValidationStageResult::errored(name, "stage panicked")
        }
    }
}

/// Combine stage results into a report.
pub fn aggregate(results: Vec<ValidationStageResult>) -> ReadinessReport {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for result in results.iter().filter(|r| r.status != StageStatus::Error) {
        let weight = STAGE_WEIGHTS
            .iter()
            .find(|(name, _)| *name == result.name)
            .map_or(0.0, |(_, w)| *w);
        weighted += weight * result.score;
        total_weight += weight;
    }

    let mut critical_issues = Vec::new();
    let mut warnings = Vec::new();
    for result in &results {
        for issue in &result.issues {
            let line = format!("{}: {}", stages::title(&result.name), issue.message);
            match issue.severity {
                IssueSeverity::Critical => critical_issues.push(line),
                IssueSeverity::Warning => warnings.push(line),
            }
        }
    }

    let all_errored = results.iter().all(|r| r.status == StageStatus::Error);
    let readiness_score = if all_errored || total_weight == 0.0 {
        0.0
    } else {
        weighted / total_weight
    };

    let overall_status = if all_errored {
        OverallStatus::Error
    } else if !critical_issues.is_empty() {
        OverallStatus::NotReady
    } else if readiness_score >= READY_SCORE {
        OverallStatus::Ready
    } else if readiness_score >= IMPROVEMENT_SCORE {
        OverallStatus::NeedsImprovement
    } else {
        OverallStatus::NotReady
    };

    let recommendations = recommendations(&results, overall_status);

    ReadinessReport {
        overall_status,
        readiness_score,
        critical_issues,
        warnings,
        recommendations,
        stages: results
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect::<BTreeMap<_, _>>(),
        generated_at: chrono::Utc::now(),
    }
}

fn recommendations(results: &[ValidationStageResult], status: OverallStatus) -> Vec<String> {
    let mut out = Vec::new();

    for (name, _) in STAGE_WEIGHTS {
        let Some(result) = results.iter().find(|r| r.name == name) else {
            continue;
        };
        let advice = match (name, result.status) {
            (_, StageStatus::Pass) => continue,
            (_, StageStatus::Error) => format!(
                "Investigate why the {} could not run and re-validate",
                stages::title(name).to_lowercase()
            ),
            (stages::QUALITY, _) => {
                "Improve quality, coherence and precision before promoting".to_string()
            }
            (stages::PERFORMANCE, _) => {
                "Reduce store latency and raise the dependent orchestrator success rate".to_string()
            }
            (stages::DATA_INTEGRITY, _) => {
                "Verify the database schema and make sure quality and task data are being recorded"
                    .to_string()
            }
            (stages::SERVICE_HEALTH, _) => {
                "Restore unhealthy dependent services and configure health endpoints for all of them"
                    .to_string()
            }
            (stages::TASK_PROCESSING, _) => {
                "Process more tasks and bring the failure rate under the limit".to_string()
            }
            (stages::SECURITY, _) => {
                "Configure a healthy enforcement/audit service and keep the audit trail table"
                    .to_string()
            }
            _ => continue,
        };
        out.push(advice);
    }

    match status {
        OverallStatus::Ready => {
            out.push("System is ready; promotion to the next level may proceed".to_string())
        }
        OverallStatus::NeedsImprovement => out.push(
            "Address the warnings above and monitor quality trends before promoting".to_string(),
        ),
        OverallStatus::NotReady => {
            out.push("Resolve all critical issues before attempting a transition".to_string())
        }
        OverallStatus::Error => {
            out.push("Validation could not run; check collaborator connectivity".to_string())
        }
    }

    out
}
