//! On-disk SQLite store behaviour

use rollout_store::{
    ModeStore, SqliteModeStore, StoreDiagnostics, StoreError, QUALITY_METRICS_TABLE, TASKS_TABLE,
};
use rollout_types::{
    AuthorityLevel, Issue, ModeState, QualitySample, TransitionPhase, TransitionRecord,
    TransitionStatus,
};

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollout.db");

    {
        let store = SqliteModeStore::open(&path).await.unwrap();
        let mut state = ModeState::at_level(AuthorityLevel::Partial);
        state.transition_attempts = 2;
        state.last_attempt_at = Some(chrono::Utc::now());
        state.configuration_snapshot = serde_json::json!({ "level": "partial" });
        store.save_state(&state).await.unwrap();
    }

    let store = SqliteModeStore::open(&path).await.unwrap();
    let state = store.load_state().await.unwrap();
    assert_eq!(state.current_level, AuthorityLevel::Partial);
    assert_eq!(state.transition_phase, TransitionPhase::Stable);
    assert_eq!(state.transition_attempts, 2);
    assert!(state.last_attempt_at.is_some());
    assert_eq!(state.configuration_snapshot["level"], "partial");
}

#[tokio::test]
async fn transition_lifecycle_and_sealing() {
    let store = SqliteModeStore::in_memory().await.unwrap();

    let mut record = TransitionRecord::initiate(
        AuthorityLevel::Observing,
        AuthorityLevel::Partial,
        "manual promotion",
        1,
    );
    record.quality_score_at_start = 0.42;
    record.id = store.insert_transition(&record).await.unwrap();
    assert!(record.id > 0);

    record.status = TransitionStatus::Validating;
    store.update_transition(&record).await.unwrap();

    record.validation_snapshot = vec![Issue::critical("readiness_gate", "quality too low")];
    record.seal(TransitionStatus::RolledBack, Some("blocked".into()));
    store.update_transition(&record).await.unwrap();

    let stored = store.get_transition(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransitionStatus::RolledBack);
    assert_eq!(stored.rollback_reason.as_deref(), Some("blocked"));
    assert_eq!(stored.validation_snapshot.len(), 1);
    assert!(stored.completed_at.is_some());
    assert!((stored.quality_score_at_start - 0.42).abs() < 1e-12);

    record.rollback_reason = Some("rewritten".into());
    let err = store.update_transition(&record).await.unwrap_err();
    assert!(matches!(err, StoreError::Sealed(_)));

    let mut missing = record.clone();
    missing.id = 999;
    missing.status = TransitionStatus::Applying;
    let err = store.update_transition(&missing).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn history_is_newest_first() {
    let store = SqliteModeStore::in_memory().await.unwrap();
    for attempt in 1..=3 {
        let record = TransitionRecord::initiate(
            AuthorityLevel::Observing,
            AuthorityLevel::Partial,
            format!("attempt {}", attempt),
            attempt,
        );
        store.insert_transition(&record).await.unwrap();
    }

    let history = store.list_transitions(2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].attempt_number, 3);
    assert_eq!(history[1].attempt_number, 2);
}

#[tokio::test]
async fn diagnostics_see_quality_samples_and_foreign_tables() {
    let store = SqliteModeStore::in_memory().await.unwrap();

    assert_eq!(store.row_count(QUALITY_METRICS_TABLE).await.unwrap(), Some(0));
    store
        .record_quality_sample(&QualitySample::with_quality(chrono::Utc::now(), 0.81))
        .await
        .unwrap();
    assert_eq!(store.row_count(QUALITY_METRICS_TABLE).await.unwrap(), Some(1));

    sqlx::query("CREATE TABLE tasks (id INTEGER PRIMARY KEY, status TEXT)")
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO tasks (status) VALUES ('done'), ('done')")
        .execute(store.pool())
        .await
        .unwrap();

    assert_eq!(store.table_names().await.unwrap().len(), 4);
    assert_eq!(store.row_count(TASKS_TABLE).await.unwrap(), Some(2));
    assert_eq!(store.row_count("missing; DROP TABLE tasks").await.unwrap(), None);
    assert!(store.health_check().await.is_ok());
}

#[tokio::test]
async fn quality_samples_older_than_a_day_are_evicted_on_insert() {
    let store = SqliteModeStore::in_memory().await.unwrap();
    let now = chrono::Utc::now();

    for hours_ago in [72, 48, 0] {
        store
            .record_quality_sample(&QualitySample::with_quality(
                now - chrono::Duration::hours(hours_ago),
                0.8,
            ))
            .await
            .unwrap();
    }
    assert_eq!(store.row_count(QUALITY_METRICS_TABLE).await.unwrap(), Some(1));

    // Inside the window survives
    store
        .record_quality_sample(&QualitySample::with_quality(
            now + chrono::Duration::hours(23),
            0.82,
        ))
        .await
        .unwrap();
    assert_eq!(store.row_count(QUALITY_METRICS_TABLE).await.unwrap(), Some(2));
}
