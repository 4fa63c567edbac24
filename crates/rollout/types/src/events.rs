//! Event types for rollout observability
//!
//! Events give observers a unified stream of transition and automation
//! activity. They are delivered over a broadcast channel; the explicit
//! return values of the controller remain the source of truth.

use crate::level::AuthorityLevel;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all rollout events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Event source
    pub source: EventSource,

    /// Event severity
    pub severity: EventSeverity,

    /// Actor who triggered the event
    pub actor: Option<String>,

    /// The actual event
    pub event: RolloutEvent,
}

impl RolloutEventEnvelope {
    /// Wrap an event, deriving source and severity from it.
    pub fn new(event: RolloutEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            source: event.source(),
            severity: event.severity(),
            actor: None,
            event,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Event sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSource {
    /// Transition controller
    Controller,
    /// Trend monitor
    Monitor,
    /// Operator command
    Operator,
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level event
    Debug,
    /// Informational event
    Info,
    /// Warning event
    Warning,
    /// Error event
    Error,
    /// Critical event requiring immediate attention
    Critical,
}

/// Rollout events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RolloutEvent {
    // ═══════════════════════════════════════════════════════════════════
    // TRANSITION EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// Transition started
    TransitionStarted {
        transition_id: i64,
        from: AuthorityLevel,
        to: AuthorityLevel,
        reason: String,
        attempt: u32,
    },

    /// Transition completed and sealed
    TransitionCompleted {
        transition_id: i64,
        from: AuthorityLevel,
        to: AuthorityLevel,
        quality_before: f64,
        quality_after: f64,
    },

    /// Transition failed and the previous level was restored
    TransitionRolledBack {
        transition_id: i64,
        from: AuthorityLevel,
        to: AuthorityLevel,
        reason: String,
    },

    /// Restoring the previous level failed; operator action required
    RollbackFailed {
        transition_id: i64,
        original: String,
        rollback: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // AUTOMATION EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// Trend monitor invoked the controller
    AutoTransitionTriggered {
        from: AuthorityLevel,
        to: AuthorityLevel,
        quality: f64,
    },

    /// Trend monitor evaluated and declined to transition
    AutoTransitionSkipped { reason: String },

    /// Classified trend changed between polls
    TrendChanged { from: String, to: String },

    // ═══════════════════════════════════════════════════════════════════
    // OPERATOR EVENTS
    // ═══════════════════════════════════════════════════════════════════
    /// Attempt counter cleared
    AttemptsReset { previous: u32 },

    /// State forced back to stable after a failed rollback
    OperatorRecovered {
        level: AuthorityLevel,
        previous_phase: String,
    },
}

impl RolloutEvent {
    pub fn source(&self) -> EventSource {
        match self {
            RolloutEvent::TransitionStarted { .. }
            | RolloutEvent::TransitionCompleted { .. }
            | RolloutEvent::TransitionRolledBack { .. }
            | RolloutEvent::RollbackFailed { .. } => EventSource::Controller,
            RolloutEvent::AutoTransitionTriggered { .. }
            | RolloutEvent::AutoTransitionSkipped { .. }
            | RolloutEvent::TrendChanged { .. } => EventSource::Monitor,
            RolloutEvent::AttemptsReset { .. } | RolloutEvent::OperatorRecovered { .. } => {
                EventSource::Operator
            }
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            RolloutEvent::RollbackFailed { .. } => EventSeverity::Critical,
            RolloutEvent::TransitionRolledBack { .. } => EventSeverity::Warning,
            RolloutEvent::OperatorRecovered { .. } => EventSeverity::Warning,
            RolloutEvent::AutoTransitionSkipped { .. } => EventSeverity::Debug,
            _ => EventSeverity::Info,
        }
    }
}
