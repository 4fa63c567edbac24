//! End-to-end readiness validation with in-process collaborators

use std::sync::Arc;

use async_trait::async_trait;
use rollout_metrics::{
    MetricsResult, MetricsSource, ServiceEndpoint, StaticHealthChecker, StaticMetricsSource,
};
use rollout_store::{InMemoryModeStore, ModeStore, TASKS_TABLE};
use rollout_types::{AuthorityLevel, MetricsSnapshot, OverallStatus, QualitySample, StageStatus};
use rollout_validator::{stages, ReadinessValidator, ValidatorConfig};

fn strong_metrics() -> MetricsSnapshot {
    MetricsSnapshot {
        quality: 0.90,
        coherence: 0.85,
        precision: 0.92,
        dependent_success_rate: 0.99,
        completed_tasks: 120,
        failed_tasks: 1,
        failure_rate: 0.01,
        avg_execution_ms: 250.0,
        ..Default::default()
    }
}

fn config() -> ValidatorConfig {
    ValidatorConfig {
        services: vec![
            ServiceEndpoint::new("orchestrator", "http://orchestrator/health"),
            ServiceEndpoint::new("planner", "http://planner/health"),
        ],
        audit_service: Some(ServiceEndpoint::new("audit", "http://audit/health")),
        ..Default::default()
    }
}

async fn populated_store() -> InMemoryModeStore {
    let store = InMemoryModeStore::new();
    store.set_external_table(TASKS_TABLE, 120).await;
    store
        .record_quality_sample(&QualitySample::with_quality(chrono::Utc::now(), 0.9))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn strong_system_is_ready() {
    let validator = ReadinessValidator::new(
        config(),
        Arc::new(StaticMetricsSource::new(strong_metrics())),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(populated_store().await),
    );

    let report = validator.validate().await;

    assert_eq!(report.overall_status, OverallStatus::Ready);
    assert!(report.readiness_score >= 75.0);
    assert!(report.critical_issues.is_empty());
    assert_eq!(report.stages.len(), 6);
    assert!(report
        .stages
        .values()
        .all(|s| s.status == StageStatus::Pass));
}

#[tokio::test]
async fn unhealthy_service_makes_report_not_ready() {
    let checker = StaticHealthChecker::all_healthy();
    checker.set_unhealthy("planner").await;

    let validator = ReadinessValidator::new(
        config(),
        Arc::new(StaticMetricsSource::new(strong_metrics())),
        Arc::new(checker),
        Arc::new(populated_store().await),
    );

    let report = validator.validate().await;
    assert_eq!(report.overall_status, OverallStatus::NotReady);
    assert_eq!(report.stages[stages::SERVICE_HEALTH].score, 50.0);
    assert!(report
        .critical_issues
        .iter()
        .any(|i| i.contains("planner")));
}

#[tokio::test]
async fn metrics_outage_errors_only_dependent_stages() {
    let source = StaticMetricsSource::new(strong_metrics());
    source.set_failing(true);

    let validator = ReadinessValidator::new(
        config(),
        Arc::new(source),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(populated_store().await),
    );

    let report = validator.validate().await;
    for name in [stages::QUALITY, stages::PERFORMANCE, stages::TASK_PROCESSING] {
        assert_eq!(report.stages[name].status, StageStatus::Error, "{}", name);
    }
    for name in [stages::DATA_INTEGRITY, stages::SERVICE_HEALTH, stages::SECURITY] {
        assert_eq!(report.stages[name].status, StageStatus::Pass, "{}", name);
    }
    assert_ne!(report.overall_status, OverallStatus::Error);
}

struct PanickingSource;

#[async_trait]
impl MetricsSource for PanickingSource {
    async fn fetch(&self) -> MetricsResult<MetricsSnapshot> {
        panic!("telemetry decoder exploded");
    }
}

#[tokio::test]
async fn panicking_stage_is_isolated() {
    let validator = ReadinessValidator::new(
        config(),
        Arc::new(PanickingSource),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(populated_store().await),
    );

    let report = validator.validate().await;
    assert_eq!(report.stages[stages::QUALITY].status, StageStatus::Error);
    assert_eq!(report.stages[stages::SECURITY].status, StageStatus::Pass);
}

#[tokio::test]
async fn check_readiness_uses_store_health() {
    let store = populated_store().await;
    store.set_available(false);
    assert!(store.health_check().await.is_err());

    let validator = ReadinessValidator::new(
        config(),
        Arc::new(StaticMetricsSource::new(strong_metrics())),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(store),
    );

    let (_, gate) = validator
        .check_readiness(AuthorityLevel::Partial, 0, 3)
        .await
        .unwrap();
    assert!(gate.ready);

    let (metrics, gate) = validator
        .check_readiness(AuthorityLevel::Full, 0, 3)
        .await
        .unwrap();
    assert_eq!(metrics.quality, 0.90);
    assert!(!gate.ready);
    assert_eq!(gate.blockers.len(), 1);
}
