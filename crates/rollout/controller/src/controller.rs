//! Transition controller: the authority state machine
//!
//! Every level change goes through [`TransitionController::execute_transition`]:
//! preconditions, readiness gate, health checks, authority switch, settle,
//! post-check, and rollback on failure. All state is persisted through the
//! injected [`RolloutStore`].

use std::sync::Arc;

use rollout_metrics::{AuthoritySwitch, HealthChecker, MetricsSource};
use rollout_store::RolloutStore;
use rollout_types::{
    AuthorityLevel, MetricsSnapshot, ModeState, RolloutEvent, RolloutEventEnvelope,
    TransitionKind, TransitionPhase, TransitionRecord, TransitionStatus,
};
use rollout_validator::{evaluate_transition_readiness, GateContext};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::config::ControllerConfig;
use crate::error::{Result, TransitionError};
use crate::events::EventBus;

/// Tolerance for comparing quality drops in percentage points
const REGRESSION_EPSILON: f64 = 1e-9;

/// Issue stage name used for readiness gate blockers in the audit trail
const GATE_STAGE: &str = "readiness_gate";

/// Outcome of a successful transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionReport {
    /// Sealed audit record
    pub record: TransitionRecord,
    /// Metrics before the switch
    pub before: MetricsSnapshot,
    /// Metrics after the settle period
    pub after: MetricsSnapshot,
}

impl TransitionReport {
    /// Quality change in percentage points (positive is an improvement)
    pub fn quality_delta(&self) -> f64 {
        (self.after.quality - self.before.quality) * 100.0
    }
}

/// A failure inside the guarded section, with whether the switch was reached
struct AttemptFailure {
    error: TransitionError,
    switch_invoked: bool,
}

impl AttemptFailure {
    fn before_switch(error: impl Into<TransitionError>) -> Self {
        Self {
            error: error.into(),
            switch_invoked: false,
        }
    }

    fn after_switch(error: impl Into<TransitionError>) -> Self {
        Self {
            error: error.into(),
            switch_invoked: true,
        }
    }
}

/// Quality-gated state machine for the governed component's authority level
pub struct TransitionController {
    config: ControllerConfig,
    store: Arc<dyn RolloutStore>,
    metrics: Arc<dyn MetricsSource>,
    health: Arc<dyn HealthChecker>,
    switch: Arc<dyn AuthoritySwitch>,
    events: EventBus,
    /// Single-flight guard; acquired with `try_lock` only
    guard: Mutex<()>,
}

impl TransitionController {
    /// Create a new controller
    pub fn new(
        config: ControllerConfig,
        store: Arc<dyn RolloutStore>,
        metrics: Arc<dyn MetricsSource>,
        health: Arc<dyn HealthChecker>,
        switch: Arc<dyn AuthoritySwitch>,
    ) -> Self {
        Self {
            config,
            store,
            metrics,
            health,
            switch,
            events: EventBus::new(),
            guard: Mutex::new(()),
        }
    }

    /// Use an existing event bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Event bus shared with other components
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to rollout events
    pub fn subscribe(&self) -> broadcast::Receiver<RolloutEventEnvelope> {
        self.events.subscribe()
    }

    /// Current mode state
    pub async fn state(&self) -> Result<ModeState> {
        Ok(self.store.load_state().await?)
    }

    /// Most recent transition records, newest first
    pub async fn history(&self, limit: usize) -> Result<Vec<TransitionRecord>> {
        Ok(self.store.list_transitions(limit).await?)
    }

    /// Move the governed component to `target`.
    #[instrument(skip(self, reason), fields(to = %target))]
    pub async fn execute_transition(
        &self,
        target: AuthorityLevel,
        reason: &str,
    ) -> Result<TransitionReport> {
        let _guard = self.guard.try_lock().map_err(|_| {
            TransitionError::InvalidState("another transition is already in progress".to_string())
        })?;

        let mut state = self.store.load_state().await?;
        let from = state.current_level;

        if !state.is_stable() {
            return Err(TransitionError::InvalidState(format!(
                "transition phase is {}, expected stable",
                state.transition_phase
            )));
        }
        if target == from {
            return Err(TransitionError::NoOp);
        }
        if !from.is_adjacent(target) {
            return Err(TransitionError::InvalidState(format!(
                "cannot move from {} to {}: levels must be adjacent",
                from, target
            )));
        }
        if state.transition_attempts >= self.config.max_transition_attempts {
            return Err(TransitionError::AttemptsExceeded {
                attempts: state.transition_attempts,
                max: self.config.max_transition_attempts,
            });
        }

        let prior_state = state.clone();
        state.transition_phase = TransitionPhase::Transitioning;
        state.transition_attempts += 1;
        state.last_attempt_at = Some(chrono::Utc::now());
        state.touch();
        self.store.save_state(&state).await?;

        let mut record = TransitionRecord::initiate(from, target, reason, state.transition_attempts);
        record.id = match self.store.insert_transition(&record).await {
            Ok(id) => id,
            Err(e) => {
                // Nothing started yet, so put the state back as it was.
                if let Err(restore) = self.store.save_state(&prior_state).await {
                    error!(error = %restore, "Failed to restore state after insert failure");
                }
                return Err(e.into());
            }
        };

        info!(
            transition_id = record.id,
            from = %from,
            to = %target,
            attempt = state.transition_attempts,
            reason,
            "Transition started"
        );
        self.events.emit(RolloutEvent::TransitionStarted {
            transition_id: record.id,
            from,
            to: target,
            reason: reason.to_string(),
            attempt: state.transition_attempts,
        });

        match self
            .attempt(&mut record, from, target, prior_state.transition_attempts)
            .await
        {
            Ok((before, after)) => self.complete(state, record, before, after).await,
            Err(failure) => Err(self.roll_back(state, record, failure).await),
        }
    }

    /// Steps between record creation and success; no state mutation here.
    async fn attempt(
        &self,
        record: &mut TransitionRecord,
        from: AuthorityLevel,
        target: AuthorityLevel,
        prior_attempts: u32,
    ) -> std::result::Result<(MetricsSnapshot, MetricsSnapshot), AttemptFailure> {
        record.status = TransitionStatus::Validating;
        self.store
            .update_transition(record)
            .await
            .map_err(AttemptFailure::before_switch)?;

        let before = self
            .metrics
            .fetch()
            .await
            .map_err(AttemptFailure::before_switch)?;
        record.quality_score_at_start = before.quality;
        record.dependent_service_success_rate = before.dependent_success_rate;

        if record.kind == TransitionKind::Forward {
            let store_healthy = self.store.health_check().await.is_ok();
            let gate = evaluate_transition_readiness(
                &before,
                target,
                &GateContext {
                    store_healthy,
                    transition_attempts: prior_attempts,
                    max_attempts: self.config.max_transition_attempts,
                },
            );
            if !gate.ready {
                record.validation_snapshot = gate.to_issues(GATE_STAGE);
                return Err(AttemptFailure::before_switch(TransitionError::Blocked {
                    blockers: gate.blockers,
                }));
            }
        } else {
            debug!(from = %from, to = %target, "Demotion skips the readiness gate");
        }

        self.pre_transition_checks(&before, target)
            .await
            .map_err(AttemptFailure::before_switch)?;

        record.status = TransitionStatus::Applying;
        self.store
            .update_transition(record)
            .await
            .map_err(AttemptFailure::before_switch)?;

        if let Err(e) = self.switch.apply(target).await {
            return Err(AttemptFailure::after_switch(TransitionError::Switch(e)));
        }

        let settle = self.config.settle_period();
        if !settle.is_zero() {
            debug!(settle_secs = settle.as_secs(), "Waiting for the new level to settle");
            tokio::time::sleep(settle).await;
        }

        let after = self
            .metrics
            .fetch()
            .await
            .map_err(AttemptFailure::after_switch)?;

        let drop = (before.quality - after.quality) * 100.0;
        if drop - self.config.quality_regression_threshold > REGRESSION_EPSILON {
            return Err(AttemptFailure::after_switch(
                TransitionError::QualityRegression {
                    before: before.quality,
                    after: after.quality,
                    drop,
                },
            ));
        }

        Ok((before, after))
    }

    async fn pre_transition_checks(
        &self,
        metrics: &MetricsSnapshot,
        target: AuthorityLevel,
    ) -> Result<()> {
        if let Some(orchestrator) = &self.config.orchestrator {
            let health = self.health.check(orchestrator).await;
            if !health.healthy {
                return Err(TransitionError::HealthCheckFailed {
                    reason: format!(
                        "dependent orchestrator '{}' is unhealthy: {}",
                        orchestrator.name,
                        health.error.as_deref().unwrap_or("no response")
                    ),
                });
            }
        }

        if let Err(e) = self.store.health_check().await {
            return Err(TransitionError::HealthCheckFailed {
                reason: format!("mode state store is unhealthy: {}", e),
            });
        }

        if target == AuthorityLevel::Full && metrics.coherence < self.config.coherence_floor {
            return Err(TransitionError::HealthCheckFailed {
                reason: format!(
                    "coherence {:.1}% is below the {:.0}% floor for full",
                    metrics.coherence * 100.0,
                    self.config.coherence_floor * 100.0
                ),
            });
        }

        Ok(())
    }

    /// Persist the new level, then seal the record. A failed write here
    /// leaves the switch applied, so it is handled like any post-switch
    /// failure and rolled back.
    async fn complete(
        &self,
        state: ModeState,
        record: TransitionRecord,
        before: MetricsSnapshot,
        after: MetricsSnapshot,
    ) -> Result<TransitionReport> {
        let target = record.to_level;
        let mut completed = state.clone();
        completed.current_level = target;
        completed.transition_phase = TransitionPhase::Stable;
        completed.transition_attempts = 0;
        completed.configuration_snapshot = serde_json::json!({
            "level": target,
            "applied_at": chrono::Utc::now(),
            "transition_id": record.id,
        });
        completed.touch();
        if let Err(e) = self.store.save_state(&completed).await {
            error!(transition_id = record.id, error = %e, "Could not persist completed state");
            return Err(self
                .roll_back(state, record, AttemptFailure::after_switch(e))
                .await);
        }

        let mut sealed = record.clone();
        sealed.seal(TransitionStatus::Completed, None);
        if let Err(e) = self.store.update_transition(&sealed).await {
            error!(transition_id = record.id, error = %e, "Could not seal completed record");
            return Err(self
                .roll_back(state, record, AttemptFailure::after_switch(e))
                .await);
        }

        info!(
            transition_id = sealed.id,
            from = %sealed.from_level,
            to = %target,
            quality_before = before.quality,
            quality_after = after.quality,
            "Transition completed"
        );
        self.events.emit(RolloutEvent::TransitionCompleted {
            transition_id: sealed.id,
            from: sealed.from_level,
            to: target,
            quality_before: before.quality,
            quality_after: after.quality,
        });

        Ok(TransitionReport {
            record: sealed,
            before,
            after,
        })
    }

    /// Restore the previous level and seal the record. Returns the error to
    /// surface to the caller.
    async fn roll_back(
        &self,
        mut state: ModeState,
        mut record: TransitionRecord,
        failure: AttemptFailure,
    ) -> TransitionError {
        let original = failure.error;
        let from = record.from_level;
        warn!(
            transition_id = record.id,
            from = %from,
            to = %record.to_level,
            error = %original,
            "Transition failed, rolling back"
        );

        match self
            .restore(&mut state, from, failure.switch_invoked)
            .await
        {
            Ok(()) => {
                record.seal(TransitionStatus::RolledBack, Some(original.to_string()));
                if let Err(e) = self.store.update_transition(&record).await {
                    error!(transition_id = record.id, error = %e, "Failed to seal rolled back record");
                }

                self.events.emit(RolloutEvent::TransitionRolledBack {
                    transition_id: record.id,
                    from,
                    to: record.to_level,
                    reason: original.to_string(),
                });
                original
            }
            Err(rollback) => {
                error!(
                    transition_id = record.id,
                    original = %original,
                    rollback = %rollback,
                    "Rollback failed; operator recovery required"
                );
                record.seal(
                    TransitionStatus::Failed,
                    Some(format!("{}; rollback failed: {}", original, rollback)),
                );
                if let Err(e) = self.store.update_transition(&record).await {
                    error!(transition_id = record.id, error = %e, "Failed to seal failed record");
                }

                self.events.emit(RolloutEvent::RollbackFailed {
                    transition_id: record.id,
                    original: original.to_string(),
                    rollback: rollback.clone(),
                });
                TransitionError::RollbackFailed {
                    original: original.to_string(),
                    rollback,
                }
            }
        }
    }

    /// RollingBack, restore through the switch if it was reached, then Stable.
    async fn restore(
        &self,
        state: &mut ModeState,
        from: AuthorityLevel,
        switch_invoked: bool,
    ) -> std::result::Result<(), String> {
        state.transition_phase = TransitionPhase::RollingBack;
        state.touch();
        self.store
            .save_state(state)
            .await
            .map_err(|e| format!("could not persist rolling back phase: {}", e))?;

        if switch_invoked {
            self.switch
                .apply(from)
                .await
                .map_err(|e| format!("could not restore {}: {}", from, e))?;
        }

        state.current_level = from;
        state.transition_phase = TransitionPhase::Stable;
        state.touch();
        self.store
            .save_state(state)
            .await
            .map_err(|e| format!("could not persist restored state: {}", e))?;

        Ok(())
    }

    /// Clear the attempt counter. Returns the previous value.
    #[instrument(skip(self))]
    pub async fn reset_attempts(&self) -> Result<u32> {
        let _guard = self.guard.try_lock().map_err(|_| {
            TransitionError::InvalidState("a transition is in progress".to_string())
        })?;

        let mut state = self.store.load_state().await?;
        let previous = state.transition_attempts;
        state.transition_attempts = 0;
        state.touch();
        self.store.save_state(&state).await?;

        info!(previous, "Transition attempts reset by operator");
        self.events
            .emit_by(RolloutEvent::AttemptsReset { previous }, "operator");
        Ok(previous)
    }

    /// Force the state back to Stable at `level` after a failed rollback.
    ///
    /// The operator asserts which level is actually in force; the switch is
    /// not invoked.
    #[instrument(skip(self))]
    pub async fn recover(&self, level: AuthorityLevel) -> Result<ModeState> {
        let _guard = self.guard.try_lock().map_err(|_| {
            TransitionError::InvalidState("a transition is in progress".to_string())
        })?;

        let mut state = self.store.load_state().await?;
        if state.is_stable() {
            return Err(TransitionError::InvalidState(
                "state is already stable; nothing to recover".to_string(),
            ));
        }

        let previous_phase = state.transition_phase;
        state.current_level = level;
        state.transition_phase = TransitionPhase::Stable;
        state.touch();
        self.store.save_state(&state).await?;

        warn!(level = %level, previous_phase = %previous_phase, "State recovered by operator");
        self.events.emit_by(
            RolloutEvent::OperatorRecovered {
                level,
                previous_phase: previous_phase.to_string(),
            },
            "operator",
        );
        Ok(state)
    }
}
