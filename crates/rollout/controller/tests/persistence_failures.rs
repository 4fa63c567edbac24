//! Store failures after the authority switch has been applied

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rollout_controller::{ControllerConfig, TransitionController, TransitionError};
use rollout_metrics::{RecordingSwitch, StaticHealthChecker, StaticMetricsSource};
use rollout_store::{InMemoryModeStore, ModeStore, StoreDiagnostics, StoreError, StoreResult};
use rollout_types::{
    AuthorityLevel, MetricsSnapshot, ModeState, QualitySample, TransitionPhase, TransitionRecord,
    TransitionStatus,
};

/// In-memory store whose `save_state` calls fail inside a configurable range
#[derive(Clone)]
struct FlakyStore {
    inner: InMemoryModeStore,
    saves: Arc<AtomicUsize>,
    /// 1-based number of the first failing save; 0 disables failures
    fail_from: Arc<AtomicUsize>,
    /// Saves numbered `fail_until` and later succeed again
    fail_until: Arc<AtomicUsize>,
}

impl FlakyStore {
    fn new(state: ModeState) -> Self {
        Self {
            inner: InMemoryModeStore::with_state(state),
            saves: Arc::new(AtomicUsize::new(0)),
            fail_from: Arc::new(AtomicUsize::new(0)),
            fail_until: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    fn fail_saves(&self, from: usize, until: usize) {
        self.fail_from.store(from, Ordering::SeqCst);
        self.fail_until.store(until, Ordering::SeqCst);
    }

    fn heal(&self) {
        self.fail_from.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModeStore for FlakyStore {
    async fn load_state(&self) -> StoreResult<ModeState> {
        self.inner.load_state().await
    }

    async fn save_state(&self, state: &ModeState) -> StoreResult<()> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        let from = self.fail_from.load(Ordering::SeqCst);
        if from != 0 && n >= from && n < self.fail_until.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("disk full".to_string()));
        }
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
        self.inner.health_check().await
    }
}

#[async_trait]
impl StoreDiagnostics for FlakyStore {
    async fn table_names(&self) -> StoreResult<Vec<String>> {
        self.inner.table_names().await
    }

    async fn row_count(&self, table: &str) -> StoreResult<Option<u64>> {
        self.inner.row_count(table).await
    }
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

fn setup() -> (TransitionController, FlakyStore, RecordingSwitch) {
    let store = FlakyStore::new(ModeState::initial());
    let switch = RecordingSwitch::new();
    let controller = TransitionController::new(
        ControllerConfig {
            settle_period_secs: 0,
            ..Default::default()
        },
        Arc::new(store.clone()),
        Arc::new(StaticMetricsSource::new(good_metrics())),
        Arc::new(StaticHealthChecker::all_healthy()),
        Arc::new(switch.clone()),
    );
    (controller, store, switch)
}

#[tokio::test]
async fn unpersisted_completion_is_rolled_back() {
    let (controller, store, switch) = setup();
    // Save 1 marks the transition started, save 2 is the completion write.
    store.fail_saves(2, 3);

    let err = controller
        .execute_transition(AuthorityLevel::Partial, "quality is steady")
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::Store(_)));

    assert_eq!(
        switch.calls().await,
        vec![AuthorityLevel::Partial, AuthorityLevel::Observing]
    );

    let state = store.load_state().await.unwrap();
    assert_eq!(state.current_level, AuthorityLevel::Observing);
    assert_eq!(state.transition_phase, TransitionPhase::Stable);
    assert_eq!(state.transition_attempts, 1);

    let record = controller.history(1).await.unwrap().remove(0);
    assert_eq!(record.status, TransitionStatus::RolledBack);
    assert!(record.completed_at.is_some());
    assert!(record.rollback_reason.unwrap().contains("disk full"));
}

#[tokio::test]
async fn store_outage_after_switch_requires_operator() {
    let (controller, store, switch) = setup();
    store.fail_saves(2, usize::MAX);

    let err = controller
        .execute_transition(AuthorityLevel::Partial, "quality is steady")
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::RollbackFailed { .. }));
    assert!(err.requires_operator());
    assert_eq!(switch.calls().await, vec![AuthorityLevel::Partial]);

    let state = store.load_state().await.unwrap();
    assert_eq!(state.current_level, AuthorityLevel::Observing);
    assert!(!state.is_stable());

    let record = controller.history(1).await.unwrap().remove(0);
    assert_eq!(record.status, TransitionStatus::Failed);
    let reason = record.rollback_reason.unwrap();
    assert!(reason.contains("disk full"));
    assert!(reason.contains("rollback failed"));

    store.heal();
    let state = controller.recover(AuthorityLevel::Partial).await.unwrap();
    assert_eq!(state.current_level, AuthorityLevel::Partial);
    assert!(state.is_stable());
}
