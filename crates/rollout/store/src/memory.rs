//! In-memory store implementation

use crate::error::{StoreError, StoreResult};
use crate::traits::*;
use async_trait::async_trait;
use rollout_types::{ModeState, QualitySample, TransitionRecord};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// In-memory store for development and testing
#[derive(Debug, Clone)]
pub struct InMemoryModeStore {
    state: Arc<RwLock<ModeState>>,
    transitions: Arc<RwLock<Vec<TransitionRecord>>>,
    samples: Arc<RwLock<Vec<QualitySample>>>,
    external_tables: Arc<RwLock<BTreeMap<String, u64>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryModeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryModeStore {
    /// Create a new in-memory store in the initial state
    pub fn new() -> Self {
        Self::with_state(ModeState::initial())
    }

    /// Create a store seeded with a given state
    pub fn with_state(state: ModeState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            transitions: Arc::new(RwLock::new(Vec::new())),
            samples: Arc::new(RwLock::new(Vec::new())),
            external_tables: Arc::new(RwLock::new(BTreeMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Register a table owned by another component (e.g. the orchestrator's `tasks`)
    pub async fn set_external_table(&self, name: impl Into<String>, rows: u64) {
        self.external_tables.write().await.insert(name.into(), rows);
    }

    /// Simulate the store going down or coming back.
    ///
    /// Only the health probe reports unavailability; data operations keep
    /// working so rollback paths can still be exercised.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of persisted quality samples
    pub async fn sample_count(&self) -> usize {
        self.samples.read().await.len()
    }
}

#[async_trait]
impl ModeStore for InMemoryModeStore {
    async fn load_state(&self) -> StoreResult<ModeState> {
        Ok(self.state.read().await.clone())
    }

    async fn save_state(&self, state: &ModeState) -> StoreResult<()> {
        let mut current = self.state.write().await;
        *current = state.clone();
        Ok(())
    }

    async fn insert_transition(&self, record: &TransitionRecord) -> StoreResult<i64> {
        let mut transitions = self.transitions.write().await;
        let id = transitions.len() as i64 + 1;
        let mut stored = record.clone();
        stored.id = id;
        transitions.push(stored);
        Ok(id)
    }

    async fn update_transition(&self, record: &TransitionRecord) -> StoreResult<()> {
        let mut transitions = self.transitions.write().await;
        let existing = transitions
            .iter_mut()
            .find(|t| t.id == record.id)
            .ok_or_else(|| StoreError::NotFound(format!("transition {}", record.id)))?;

        if existing.is_sealed() {
            return Err(StoreError::Sealed(record.id));
        }

        *existing = record.clone();
        Ok(())
    }

    async fn get_transition(&self, id: i64) -> StoreResult<Option<TransitionRecord>> {
        let transitions = self.transitions.read().await;
        Ok(transitions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_transitions(&self, limit: usize) -> StoreResult<Vec<TransitionRecord>> {
        let transitions = self.transitions.read().await;
        Ok(transitions.iter().rev().take(limit).cloned().collect())
    }

    async fn record_quality_sample(&self, sample: &QualitySample) -> StoreResult<()> {
        let cutoff = sample.timestamp - sample_retention();
        let mut samples = self.samples.write().await;
        samples.push(sample.clone());
        samples.retain(|s| s.timestamp >= cutoff);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<Duration> {
        let started = Instant::now();
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store unavailable".to_string()));
        }
        let _ = self.state.read().await;
        Ok(started.elapsed())
    }
}

#[async_trait]
impl StoreDiagnostics for InMemoryModeStore {
    async fn table_names(&self) -> StoreResult<Vec<String>> {
        let mut names = vec![
            MODE_STATE_TABLE.to_string(),
            TRANSITIONS_TABLE.to_string(),
            QUALITY_METRICS_TABLE.to_string(),
        ];
        names.extend(self.external_tables.read().await.keys().cloned());
        Ok(names)
    }

    async fn row_count(&self, table: &str) -> StoreResult<Option<u64>> {
        let count = match table {
            MODE_STATE_TABLE => Some(1),
            TRANSITIONS_TABLE => Some(self.transitions.read().await.len() as u64),
            QUALITY_METRICS_TABLE => Some(self.samples.read().await.len() as u64),
            other => self.external_tables.read().await.get(other).copied(),
        };
        Ok(count)
    }
}
