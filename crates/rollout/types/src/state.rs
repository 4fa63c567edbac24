//! Mode state singleton

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::{AuthorityLevel, TransitionPhase};

/// Durable record of the current authority level and transition phase.
///
/// While `transition_phase` is not [`TransitionPhase::Stable`] no new
/// transition may be initiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeState {
    /// Level currently in force
    pub current_level: AuthorityLevel,

    /// Phase of the state machine
    pub transition_phase: TransitionPhase,

    /// Failed or in-flight attempts since the last successful transition
    pub transition_attempts: u32,

    /// When the last attempt started
    pub last_attempt_at: Option<DateTime<Utc>>,

    /// When quality was last sampled by the trend monitor
    pub last_quality_check: Option<DateTime<Utc>>,

    /// Start of the current run of above-threshold quality samples
    pub stability_start: Option<DateTime<Utc>>,

    /// Configuration the governed component was last switched with
    pub configuration_snapshot: serde_json::Value,

    /// Last write
    pub updated_at: DateTime<Utc>,
}

impl ModeState {
    /// Initial state: observing, stable, no attempts.
    pub fn initial() -> Self {
        Self {
            current_level: AuthorityLevel::Observing,
            transition_phase: TransitionPhase::Stable,
            transition_attempts: 0,
            last_attempt_at: None,
            last_quality_check: None,
            stability_start: None,
            configuration_snapshot: serde_json::Value::Null,
            updated_at: Utc::now(),
        }
    }

    /// A state at a given level, used by operator recovery and tests.
    pub fn at_level(level: AuthorityLevel) -> Self {
        Self {
            current_level: level,
            ..Self::initial()
        }
    }

    pub fn is_stable(&self) -> bool {
        self.transition_phase.is_stable()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::initial()
    }
}
