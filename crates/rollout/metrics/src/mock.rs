//! In-process collaborators for tests and local development

use crate::config::ServiceEndpoint;
use crate::error::{MetricsError, MetricsResult};
use crate::health::HealthChecker;
use crate::source::MetricsSource;
use crate::switch::AuthoritySwitch;
use async_trait::async_trait;
use rollout_types::{AuthorityLevel, MetricsSnapshot, ServiceHealth};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Metrics source that replays a fixed sequence of snapshots.
///
/// Each fetch returns the next snapshot; the last one repeats forever.
#[derive(Debug, Clone)]
pub struct StaticMetricsSource {
    snapshots: Arc<Mutex<VecDeque<MetricsSnapshot>>>,
    failing: Arc<AtomicBool>,
    fetches: Arc<AtomicU64>,
}

impl StaticMetricsSource {
    pub fn new(snapshot: MetricsSnapshot) -> Self {
        Self::sequence(vec![snapshot])
    }

    pub fn sequence(snapshots: Vec<MetricsSnapshot>) -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(snapshots.into())),
            failing: Arc::new(AtomicBool::new(false)),
            fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the remaining sequence with a single snapshot
    pub async fn set(&self, snapshot: MetricsSnapshot) {
        let mut snapshots = self.snapshots.lock().await;
        snapshots.clear();
        snapshots.push_back(snapshot);
    }

    /// Append a snapshot to the sequence
    pub async fn push(&self, snapshot: MetricsSnapshot) {
        self.snapshots.lock().await.push_back(snapshot);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for StaticMetricsSource {
    async fn fetch(&self) -> MetricsResult<MetricsSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(MetricsError::Unavailable("metrics source offline".to_string()));
        }

        let mut snapshots = self.snapshots.lock().await;
        let snapshot = if snapshots.len() > 1 {
            snapshots.pop_front()
        } else {
            snapshots.front().cloned()
        };

        snapshot
            .map(|mut s| {
                s.collected_at = chrono::Utc::now();
                s
            })
            .ok_or_else(|| MetricsError::Unavailable("no snapshot configured".to_string()))
    }
}

/// Health checker with scripted answers; services are healthy unless marked
#[derive(Debug, Clone, Default)]
pub struct StaticHealthChecker {
    unhealthy: Arc<Mutex<HashSet<String>>>,
}

impl StaticHealthChecker {
    pub fn all_healthy() -> Self {
        Self::default()
    }

    pub async fn set_unhealthy(&self, name: impl Into<String>) {
        self.unhealthy.lock().await.insert(name.into());
    }

    pub async fn set_healthy(&self, name: &str) {
        self.unhealthy.lock().await.remove(name);
    }
}

#[async_trait]
impl HealthChecker for StaticHealthChecker {
    async fn check(&self, service: &ServiceEndpoint) -> ServiceHealth {
        if self.unhealthy.lock().await.contains(&service.name) {
            ServiceHealth::unhealthy(&service.name, "marked unhealthy")
        } else {
            ServiceHealth::healthy(&service.name, Duration::from_millis(1))
        }
    }
}

/// Authority switch that records every call and can be told to fail
#[derive(Debug, Clone, Default)]
pub struct RecordingSwitch {
    calls: Arc<Mutex<Vec<AuthorityLevel>>>,
    fail_on: Arc<Mutex<HashSet<AuthorityLevel>>>,
}

impl RecordingSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every future call that applies `level`
    pub async fn fail_on(&self, level: AuthorityLevel) {
        self.fail_on.lock().await.insert(level);
    }

    /// Levels applied so far, in call order (including failed calls)
    pub async fn calls(&self) -> Vec<AuthorityLevel> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl AuthoritySwitch for RecordingSwitch {
    async fn apply(&self, level: AuthorityLevel) -> MetricsResult<()> {
        self.calls.lock().await.push(level);
        if self.fail_on.lock().await.contains(&level) {
            return Err(MetricsError::Switch(format!("refused to apply {}", level)));
        }
        Ok(())
    }
}
