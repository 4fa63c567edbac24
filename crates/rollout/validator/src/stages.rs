//! The six validation stages.
//!
//! Each stage gathers its own inputs and produces a scored
//! [`ValidationStageResult`]. Errors while gathering inputs are returned to
//! the caller, which turns them into `Error` stage results.

use std::collections::BTreeMap;
use std::time::Duration;

use rollout_metrics::{HealthChecker, MetricsSource};
use rollout_store::{RolloutStore, QUALITY_METRICS_TABLE, TASKS_TABLE, TRANSITIONS_TABLE};
use rollout_types::{Issue, ValidationStageResult};
use tracing::debug;

use crate::config::ValidatorConfig;
use crate::error::ValidationResult;

pub const QUALITY: &str = "quality";
pub const PERFORMANCE: &str = "performance";
pub const DATA_INTEGRITY: &str = "data_integrity";
pub const SERVICE_HEALTH: &str = "service_health";
pub const TASK_PROCESSING: &str = "task_processing";
pub const SECURITY: &str = "security";

/// Stage names with their weight in the overall score, in report order.
pub const STAGE_WEIGHTS: [(&str, f64); 6] = [
    (QUALITY, 30.0),
    (PERFORMANCE, 25.0),
    (SERVICE_HEALTH, 20.0),
    (DATA_INTEGRITY, 15.0),
    (TASK_PROCESSING, 7.0),
    (SECURITY, 3.0),
];

/// Human-readable stage title
pub fn title(stage: &str) -> &'static str {
    match stage {
        QUALITY => "Quality Assessment",
        PERFORMANCE => "Performance Assessment",
        DATA_INTEGRITY => "Data Integrity Assessment",
        SERVICE_HEALTH => "Service Health Assessment",
        TASK_PROCESSING => "Task Processing Assessment",
        SECURITY => "Security & Compliance Assessment",
        _ => "Unknown Assessment",
    }
}

fn attainment(value: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        1.0
    } else {
        (value / threshold).clamp(0.0, 1.0)
    }
}

fn penalty_score(issues: &[Issue], critical_penalty: f64, warning_penalty: f64) -> f64 {
    let critical = issues.iter().filter(|i| i.is_critical()).count() as f64;
    let warnings = issues.len() as f64 - critical;
    (100.0 - critical_penalty * critical - warning_penalty * warnings).max(0.0)
}

/// Stage 1: quality, coherence and precision against their thresholds.
pub async fn quality(
    config: &ValidatorConfig,
    metrics: &dyn MetricsSource,
) -> ValidationResult<ValidationStageResult> {
    let snapshot = metrics.fetch().await?;
    let mut issues = Vec::new();

    if snapshot.quality < config.min_quality {
        issues.push(Issue::critical(
            QUALITY,
            format!(
                "Quality score {:.1}% is below the {:.0}% threshold",
                snapshot.quality * 100.0,
                config.min_quality * 100.0
            ),
        ));
    }
    if snapshot.coherence < config.min_coherence {
        issues.push(Issue::warning(
            QUALITY,
            format!(
                "Coherence {:.1}% is below the {:.0}% threshold",
                snapshot.coherence * 100.0,
                config.min_coherence * 100.0
            ),
        ));
    }
    if snapshot.precision < config.min_precision {
        issues.push(Issue::warning(
            QUALITY,
            format!(
                "Precision {:.1}% is below the {:.0}% threshold",
                snapshot.precision * 100.0,
                config.min_precision * 100.0
            ),
        ));
    }

    let score = 100.0
        * (0.6 * attainment(snapshot.quality, config.min_quality)
            + 0.2 * attainment(snapshot.coherence, config.min_coherence)
            + 0.2 * attainment(snapshot.precision, config.min_precision));

    let raw = BTreeMap::from([
        ("quality".to_string(), snapshot.quality),
        ("coherence".to_string(), snapshot.coherence),
        ("precision".to_string(), snapshot.precision),
    ]);

    Ok(ValidationStageResult::from_issues(QUALITY, score, issues, raw))
}

/// Stage 2: store probe latency and dependent orchestrator success rate.
pub async fn performance(
    config: &ValidatorConfig,
    metrics: &dyn MetricsSource,
    store: &dyn RolloutStore,
) -> ValidationResult<ValidationStageResult> {
    let snapshot = metrics.fetch().await?;
    let mut issues = Vec::new();

    let probes = config.latency_probes.max(1);
    let mut total = Duration::ZERO;
    let mut probe_error = None;
    for _ in 0..probes {
        match store.health_check().await {
            Ok(latency) => total += latency,
            Err(e) => {
                probe_error = Some(e);
                break;
            }
        }
    }

    let latency_ms = total.as_secs_f64() * 1000.0 / probes as f64;
    let latency_score = match &probe_error {
        Some(e) => {
            issues.push(Issue::critical(
                PERFORMANCE,
                format!("Store probe failed: {}", e),
            ));
            0.0
        }
        None => {
            if latency_ms > config.max_store_latency_ms {
                issues.push(Issue::critical(
                    PERFORMANCE,
                    format!(
                        "Average store query latency {:.1}ms exceeds the {:.0}ms limit",
                        latency_ms, config.max_store_latency_ms
                    ),
                ));
            }
            if latency_ms <= 0.0 {
                100.0
            } else {
                (100.0 * config.max_store_latency_ms / latency_ms).min(100.0)
            }
        }
    };

    if snapshot.dependent_success_rate < config.required_success_rate {
        issues.push(Issue::critical(
            PERFORMANCE,
            format!(
                "Dependent orchestrator success rate {:.1}% is below the required {:.0}%",
                snapshot.dependent_success_rate * 100.0,
                config.required_success_rate * 100.0
            ),
        ));
    }
    let success_score = if config.required_success_rate <= 0.0 {
        100.0
    } else {
        (100.0 * snapshot.dependent_success_rate / config.required_success_rate).min(100.0)
    };

    debug!(latency_ms, success_rate = snapshot.dependent_success_rate, "Performance measured");

    let raw = BTreeMap::from([
        ("avg_store_latency_ms".to_string(), latency_ms),
        ("dependent_success_rate".to_string(), snapshot.dependent_success_rate),
    ]);

    Ok(ValidationStageResult::from_issues(
        PERFORMANCE,
        (latency_score + success_score) / 2.0,
        issues,
        raw,
    ))
}

/// Stage 3: structural checks against the persisted store.
pub async fn data_integrity(
    config: &ValidatorConfig,
    store: &dyn RolloutStore,
) -> ValidationResult<ValidationStageResult> {
    let tables = store.table_names().await?;
    let mut issues = Vec::new();

    if tables.len() < config.min_table_count {
        issues.push(Issue::critical(
            DATA_INTEGRITY,
            format!(
                "Store has {} tables, expected at least {}",
                tables.len(),
                config.min_table_count
            ),
        ));
    }

    let mut raw = BTreeMap::from([("table_count".to_string(), tables.len() as f64)]);

    for table in [QUALITY_METRICS_TABLE, TASKS_TABLE] {
        match store.row_count(table).await? {
            None => issues.push(Issue::critical(
                DATA_INTEGRITY,
                format!("Required table '{}' is missing", table),
            )),
            Some(0) => {
                raw.insert(format!("{}_rows", table), 0.0);
                issues.push(Issue::warning(
                    DATA_INTEGRITY,
                    format!("Table '{}' is empty", table),
                ));
            }
            Some(rows) => {
                raw.insert(format!("{}_rows", table), rows as f64);
            }
        }
    }

    let score = penalty_score(&issues, 30.0, 10.0);
    Ok(ValidationStageResult::from_issues(DATA_INTEGRITY, score, issues, raw))
}

/// Stage 4: health of the configured dependent services.
pub async fn service_health(
    config: &ValidatorConfig,
    health: &dyn HealthChecker,
) -> ValidationResult<ValidationStageResult> {
    if config.services.is_empty() {
        return Ok(ValidationStageResult::from_issues(
            SERVICE_HEALTH,
            100.0,
            vec![Issue::warning(
                SERVICE_HEALTH,
                "No dependent services configured for health checks",
            )],
            BTreeMap::new(),
        ));
    }

    let results = health.check_all(&config.services).await;
    let mut issues = Vec::new();
    let mut raw = BTreeMap::new();

    for result in &results {
        raw.insert(
            format!("{}_healthy", result.name),
            if result.healthy { 1.0 } else { 0.0 },
        );
        if !result.healthy {
            issues.push(Issue::critical(
                SERVICE_HEALTH,
                format!(
                    "Service '{}' is unhealthy: {}",
                    result.name,
                    result.error.as_deref().unwrap_or("no response")
                ),
            ));
        }
    }

    let healthy = results.iter().filter(|r| r.healthy).count();
    let score = healthy as f64 / results.len() as f64 * 100.0;
    Ok(ValidationStageResult::from_issues(SERVICE_HEALTH, score, issues, raw))
}

/// Stage 5: task throughput, reliability and execution time sanity.
pub async fn task_processing(
    config: &ValidatorConfig,
    metrics: &dyn MetricsSource,
) -> ValidationResult<ValidationStageResult> {
    let snapshot = metrics.fetch().await?;
    let mut issues = Vec::new();

    if snapshot.completed_tasks < config.min_completed_tasks {
        issues.push(Issue::critical(
            TASK_PROCESSING,
            format!(
                "Only {} tasks completed, at least {} required",
                snapshot.completed_tasks, config.min_completed_tasks
            ),
        ));
    }
    if snapshot.failure_rate > config.max_failure_rate {
        issues.push(Issue::critical(
            TASK_PROCESSING,
            format!(
                "Task failure rate {:.1}% exceeds the {:.0}% limit",
                snapshot.failure_rate * 100.0,
                config.max_failure_rate * 100.0
            ),
        ));
    }
    if snapshot.avg_execution_ms <= 0.0 {
        issues.push(Issue::warning(
            TASK_PROCESSING,
            "Average execution time is not reported",
        ));
    } else if snapshot.avg_execution_ms > config.max_avg_execution_ms {
        issues.push(Issue::warning(
            TASK_PROCESSING,
            format!(
                "Average execution time {:.0}ms exceeds {:.0}ms",
                snapshot.avg_execution_ms, config.max_avg_execution_ms
            ),
        ));
    }

    let sufficiency = if config.min_completed_tasks == 0 {
        100.0
    } else {
        (snapshot.completed_tasks as f64 / config.min_completed_tasks as f64).min(1.0) * 100.0
    };
    let reliability = (1.0 - snapshot.failure_rate).clamp(0.0, 1.0) * 100.0;

    let raw = BTreeMap::from([
        ("completed_tasks".to_string(), snapshot.completed_tasks as f64),
        ("failed_tasks".to_string(), snapshot.failed_tasks as f64),
        ("failure_rate".to_string(), snapshot.failure_rate),
        ("avg_execution_ms".to_string(), snapshot.avg_execution_ms),
    ]);

    Ok(ValidationStageResult::from_issues(
        TASK_PROCESSING,
        (sufficiency + reliability) / 2.0,
        issues,
        raw,
    ))
}

/// Stage 6: enforcement/audit dependency and the audit trail table.
pub async fn security(
    config: &ValidatorConfig,
    health: &dyn HealthChecker,
    store: &dyn RolloutStore,
) -> ValidationResult<ValidationStageResult> {
    let mut issues = Vec::new();
    let mut raw = BTreeMap::new();

    match &config.audit_service {
        None => issues.push(Issue::warning(
            SECURITY,
            "No enforcement/audit service configured",
        )),
        Some(service) => {
            let result = health.check(service).await;
            raw.insert("audit_service_healthy".to_string(), if result.healthy { 1.0 } else { 0.0 });
            if !result.healthy {
                issues.push(Issue::critical(
                    SECURITY,
                    format!(
                        "Audit service '{}' is unhealthy: {}",
                        service.name,
                        result.error.as_deref().unwrap_or("no response")
                    ),
                ));
            }
        }
    }

    if store.row_count(TRANSITIONS_TABLE).await?.is_none() {
        issues.push(Issue::critical(
            SECURITY,
            format!("Audit trail table '{}' is missing", TRANSITIONS_TABLE),
        ));
    }

    let score = penalty_score(&issues, 25.0, 10.0);
    Ok(ValidationStageResult::from_issues(SECURITY, score, issues, raw))
}
