//! Trend monitor polling and automatic promotion

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rollout_controller::{ControllerConfig, TransitionController};
use rollout_metrics::{RecordingSwitch, StaticHealthChecker, StaticMetricsSource};
use rollout_monitor::{MonitorConfig, MonitorError, PollOutcome, QualityTrend, TrendMonitor};
use async_trait::async_trait;
use rollout_store::{InMemoryModeStore, ModeStore, StoreDiagnostics, StoreResult};
use rollout_types::{
    AuthorityLevel, MetricsSnapshot, ModeState, QualitySample, RolloutEvent, TransitionPhase,
    TransitionRecord,
};

struct Harness {
    monitor: TrendMonitor,
    controller: Arc<TransitionController>,
    store: InMemoryModeStore,
    metrics: StaticMetricsSource,
}

fn good_metrics() -> MetricsSnapshot {
    MetricsSnapshot {
        quality: 0.80,
        coherence: 0.75,
        precision: 0.85,
        dependent_success_rate: 0.97,
        completed_tasks: 30,
        failed_tasks: 1,
        failure_rate: 0.02,
        avg_execution_ms: 150.0,
        ..Default::default()
    }
}

fn with_quality(quality: f64) -> MetricsSnapshot {
    MetricsSnapshot {
        quality,
        ..good_metrics()
    }
}

fn auto_config() -> MonitorConfig {
    MonitorConfig {
        auto_transition: true,
        ..Default::default()
    }
}

fn harness_with(
    config: MonitorConfig,
    controller_config: ControllerConfig,
    state: ModeState,
    snapshots: Vec<MetricsSnapshot>,
) -> Harness {
    let store = InMemoryModeStore::with_state(state);
    let metrics = StaticMetricsSource::sequence(snapshots);
    let controller = Arc::new(TransitionController::new(
        controller_config,
        Arc::new(store.clone()),
        Arc::new(metrics.clone()),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(RecordingSwitch::new()),
    ));
    let monitor = TrendMonitor::new(
        config,
        controller.clone(),
        Arc::new(metrics.clone()),
        Arc::new(store.clone()),
    );
    Harness {
        monitor,
        controller,
        store,
        metrics,
    }
}

fn harness(config: MonitorConfig, state: ModeState, snapshots: Vec<MetricsSnapshot>) -> Harness {
    let controller_config = ControllerConfig {
        settle_period_secs: 0,
        ..Default::default()
    };
    harness_with(config, controller_config, state, snapshots)
}

fn minutes(base: DateTime<Utc>, n: i64) -> DateTime<Utc> {
    base + chrono::Duration::minutes(n)
}

fn held_reason(outcome: PollOutcome) -> String {
    match outcome {
        PollOutcome::Held { reason, .. } => reason,
        other => panic!("expected Held, got {:?}", other),
    }
}

#[tokio::test]
async fn observes_and_persists_without_automation() {
    let h = harness(
        MonitorConfig::default(),
        ModeState::initial(),
        vec![good_metrics()],
    );

    let outcome = h.monitor.poll().await.unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Observed {
            quality: 0.80,
            trend: QualityTrend::Stable
        }
    );
    assert_eq!(h.store.sample_count().await, 1);
    assert_eq!(h.monitor.history().await.len(), 1);
    assert_eq!(
        h.controller.state().await.unwrap().current_level,
        AuthorityLevel::Observing
    );
}

#[tokio::test]
async fn promotes_after_quality_holds_in_stability_window() {
    let h = harness(auto_config(), ModeState::initial(), vec![good_metrics()]);
    let base = Utc::now();

    let reason = held_reason(h.monitor.poll_at(base).await.unwrap());
    assert!(reason.contains("1 of 3"), "{}", reason);
    held_reason(h.monitor.poll_at(minutes(base, 1)).await.unwrap());

    let outcome = h.monitor.poll_at(minutes(base, 2)).await.unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Promoted {
            from: AuthorityLevel::Observing,
            to: AuthorityLevel::Partial
        }
    );

    let record = h.controller.history(1).await.unwrap().remove(0);
    assert!(record.trigger_reason.starts_with("automatic"));
}

#[tokio::test]
async fn hourly_cap_holds_further_promotions() {
    let config = MonitorConfig {
        max_auto_transitions_per_hour: 1,
        ..auto_config()
    };
    let h = harness(config, ModeState::initial(), vec![good_metrics()]);
    let base = Utc::now();

    for n in 0..2 {
        held_reason(h.monitor.poll_at(minutes(base, n)).await.unwrap());
    }
    assert!(matches!(
        h.monitor.poll_at(minutes(base, 2)).await.unwrap(),
        PollOutcome::Promoted { .. }
    ));

    let reason = held_reason(h.monitor.poll_at(minutes(base, 3)).await.unwrap());
    assert!(reason.contains("hourly limit"), "{}", reason);

    // Past the hour the window opens again, but stability restarts.
    held_reason(h.monitor.poll_at(minutes(base, 63)).await.unwrap());
    held_reason(h.monitor.poll_at(minutes(base, 64)).await.unwrap());
    assert_eq!(
        h.monitor.poll_at(minutes(base, 65)).await.unwrap(),
        PollOutcome::Promoted {
            from: AuthorityLevel::Partial,
            to: AuthorityLevel::Full
        }
    );
}

#[tokio::test]
async fn degrading_trend_holds_promotion() {
    let config = MonitorConfig {
        min_stable_samples: 10,
        ..auto_config()
    };
    let mut snapshots = vec![with_quality(0.95); 5];
    snapshots.extend(vec![with_quality(0.80); 5]);
    let h = harness(config, ModeState::at_level(AuthorityLevel::Partial), snapshots);
    let mut rx = h.controller.subscribe();
    let base = Utc::now();

    let mut last = None;
    for n in 0..10 {
        let at = base + chrono::Duration::seconds(20 * n);
        last = Some(h.monitor.poll_at(at).await.unwrap());
    }

    let reason = held_reason(last.unwrap());
    assert!(reason.contains("degrading"), "{}", reason);
    assert_eq!(h.monitor.trend().await, QualityTrend::Degrading);

    let mut saw_trend_change = false;
    while let Ok(envelope) = rx.try_recv() {
        if let RolloutEvent::TrendChanged { to, .. } = envelope.event {
            assert_eq!(to, "degrading");
            saw_trend_change = true;
        }
    }
    assert!(saw_trend_change);
}

#[tokio::test]
async fn unstable_phase_and_top_level_hold() {
    let mut state = ModeState::at_level(AuthorityLevel::Partial);
    state.transition_phase = TransitionPhase::RollingBack;
    let h = harness(auto_config(), state, vec![good_metrics()]);
    let reason = held_reason(h.monitor.poll().await.unwrap());
    assert_eq!(reason, "transition phase is rolling_back");

    let h = harness(
        auto_config(),
        ModeState::at_level(AuthorityLevel::Full),
        vec![good_metrics()],
    );
    let reason = held_reason(h.monitor.poll().await.unwrap());
    assert_eq!(reason, "already at full");
}

#[tokio::test]
async fn failing_gate_holds_with_blockers() {
    let h = harness(
        auto_config(),
        ModeState::at_level(AuthorityLevel::Partial),
        vec![with_quality(0.50)],
    );
    let reason = held_reason(h.monitor.poll().await.unwrap());
    assert!(reason.contains("readiness gate for full"), "{}", reason);
    assert!(reason.contains("50.0%"), "{}", reason);
}

#[tokio::test]
async fn metrics_failure_does_not_wedge_the_monitor() {
    let h = harness(
        MonitorConfig::default(),
        ModeState::initial(),
        vec![good_metrics()],
    );

    h.metrics.set_failing(true);
    assert!(matches!(
        h.monitor.poll().await,
        Err(MonitorError::Metrics(_))
    ));

    h.metrics.set_failing(false);
    assert!(matches!(
        h.monitor.poll().await.unwrap(),
        PollOutcome::Observed { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn concurrent_poll_is_skipped() {
    let controller_config = ControllerConfig {
        settle_period_secs: 30,
        ..Default::default()
    };
    let h = harness_with(
        auto_config(),
        controller_config,
        ModeState::initial(),
        vec![good_metrics()],
    );
    let base = Utc::now();
    held_reason(h.monitor.poll_at(base).await.unwrap());
    held_reason(h.monitor.poll_at(minutes(base, 1)).await.unwrap());

    let (first, second) = futures::join!(h.monitor.poll_at(minutes(base, 2)), async {
        tokio::task::yield_now().await;
        h.monitor.poll_at(minutes(base, 2)).await
    });

    assert!(matches!(first.unwrap(), PollOutcome::Promoted { .. }));
    assert_eq!(second.unwrap(), PollOutcome::Skipped);
}

#[tokio::test(start_paused = true)]
async fn run_polls_until_shutdown() {
    let h = harness(
        MonitorConfig::default(),
        ModeState::initial(),
        vec![good_metrics()],
    );
    let (tx, rx) = tokio::sync::watch::channel(false);

    futures::join!(h.monitor.run(rx), async {
        tokio::time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();
    });

    // Ticks at 0s, 60s and 120s.
    assert_eq!(h.metrics.fetch_count(), 3);
}

/// Store whose health check takes a while to answer
struct SlowHealthStore {
    inner: InMemoryModeStore,
    delay: Duration,
}

#[async_trait]
impl ModeStore for SlowHealthStore {
    async fn load_state(&self) -> StoreResult<ModeState> {
        self.inner.load_state().await
    }

    async fn save_state(&self, state: &ModeState) -> StoreResult<()> {
        self.inner.save_state(state).await
    }

    async fn insert_transition(&self, record: &TransitionRecord) -> StoreResult<i64> {
        self.inner.insert_transition(record).await
    }

    async fn update_transition(&self, record: &TransitionRecord) -> StoreResult<()> {
        self.inner.update_transition(record).await
    }

    async fn get_transition(&self, id: i64) -> StoreResult<Option<TransitionRecord>> {
        self.inner.get_transition(id).await
    }

    async fn list_transitions(&self, limit: usize) -> StoreResult<Vec<TransitionRecord>> {
        self.inner.list_transitions(limit).await
    }

    async fn record_quality_sample(&self, sample: &QualitySample) -> StoreResult<()> {
        self.inner.record_quality_sample(sample).await
    }

    async fn health_check(&self) -> StoreResult<Duration> {
        tokio::time::sleep(self.delay).await;
        self.inner.health_check().await
    }
}

#[async_trait]
impl StoreDiagnostics for SlowHealthStore {
    async fn table_names(&self) -> StoreResult<Vec<String>> {
        self.inner.table_names().await
    }

    async fn row_count(&self, table: &str) -> StoreResult<Option<u64>> {
        self.inner.row_count(table).await
    }
}

#[tokio::test(start_paused = true)]
async fn readers_are_not_blocked_by_a_slow_health_check() {
    let store = InMemoryModeStore::new();
    let metrics = StaticMetricsSource::new(good_metrics());
    let controller = Arc::new(TransitionController::new(
        ControllerConfig {
            settle_period_secs: 0,
            ..Default::default()
        },
        Arc::new(store.clone()),
        Arc::new(metrics.clone()),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(RecordingSwitch::new()),
    ));
    let monitor = TrendMonitor::new(
        auto_config(),
        controller,
        Arc::new(metrics),
        Arc::new(SlowHealthStore {
            inner: store,
            delay: Duration::from_secs(30),
        }),
    );

    let base = Utc::now();
    held_reason(monitor.poll_at(base).await.unwrap());

    let (outcome, history) = futures::join!(monitor.poll_at(minutes(base, 1)), async {
        tokio::task::yield_now().await;
        tokio::time::timeout(Duration::from_secs(1), monitor.history()).await
    });

    let history = history.expect("history() waited on the store health check");
    assert_eq!(history.len(), 1);
    assert_eq!(monitor.trend().await, QualityTrend::Stable);
    held_reason(outcome.unwrap());
    assert_eq!(monitor.history().await.len(), 2);
}
