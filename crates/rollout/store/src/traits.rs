//! Store trait definitions

use crate::error::StoreResult;
use async_trait::async_trait;
use rollout_types::{ModeState, QualitySample, TransitionRecord};
use std::time::Duration;

/// Singleton mode state table
pub const MODE_STATE_TABLE: &str = "mode_state";
/// Transition audit trail table
pub const TRANSITIONS_TABLE: &str = "mode_transitions";
/// Persisted quality samples
pub const QUALITY_METRICS_TABLE: &str = "quality_metrics";
/// Task table owned by the orchestrator sharing the database
pub const TASKS_TABLE: &str = "tasks";

/// Persisted quality samples older than this, relative to the newest insert, are evicted
pub const SAMPLE_RETENTION_HOURS: i64 = 24;

/// Retention window for persisted quality samples
pub fn sample_retention() -> chrono::Duration {
    chrono::Duration::hours(SAMPLE_RETENTION_HOURS)
}

/// Combined store trait used by the controller, validator and monitor
pub trait RolloutStore: ModeStore + StoreDiagnostics {}

impl<T: ModeStore + StoreDiagnostics + ?Sized> RolloutStore for T {}

/// Repository for the mode state singleton and the transition audit trail
#[async_trait]
pub trait ModeStore: Send + Sync {
    /// Load the current mode state, initialising it when absent
    async fn load_state(&self) -> StoreResult<ModeState>;

    /// Persist the mode state
    async fn save_state(&self, state: &ModeState) -> StoreResult<()>;

    /// Insert a new transition record and return its assigned id
    async fn insert_transition(&self, record: &TransitionRecord) -> StoreResult<i64>;

    /// Update an existing record. Sealed records are rejected.
    async fn update_transition(&self, record: &TransitionRecord) -> StoreResult<()>;

    /// Get a transition record by id
    async fn get_transition(&self, id: i64) -> StoreResult<Option<TransitionRecord>>;

    /// Most recent transition records, newest first
    async fn list_transitions(&self, limit: usize) -> StoreResult<Vec<TransitionRecord>>;

    /// Append a quality sample to the persisted history
    async fn record_quality_sample(&self, sample: &QualitySample) -> StoreResult<()>;

    /// Probe the store and return the round-trip latency
    async fn health_check(&self) -> StoreResult<Duration>;
}

/// Read-only structural inspection used by the data integrity checks
#[async_trait]
pub trait StoreDiagnostics: Send + Sync {
    /// Names of all user tables
    async fn table_names(&self) -> StoreResult<Vec<String>>;

    /// Row count for a table, `None` when the table does not exist
    async fn row_count(&self, table: &str) -> StoreResult<Option<u64>>;
}
