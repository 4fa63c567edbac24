//! Transition audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::level::{AuthorityLevel, ParseLevelError};
use crate::validation::Issue;

/// Direction of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Promotion to the next level
    Forward,
    /// Demotion to the previous level
    Rollback,
}

impl TransitionKind {
    /// Kind implied by moving between two levels.
    pub fn between(from: AuthorityLevel, to: AuthorityLevel) -> Self {
        if to > from {
            TransitionKind::Forward
        } else {
            TransitionKind::Rollback
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Forward => "forward",
            TransitionKind::Rollback => "rollback",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(TransitionKind::Forward),
            "rollback" => Ok(TransitionKind::Rollback),
            _ => Err(ParseLevelError {
                kind: "transition kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a transition record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStatus {
    Initiated,
    Validating,
    Applying,
    Completed,
    Failed,
    RolledBack,
}

impl TransitionStatus {
    /// Sealed records are never mutated again.
    pub fn is_sealed(&self) -> bool {
        matches!(
            self,
            TransitionStatus::Completed | TransitionStatus::Failed | TransitionStatus::RolledBack
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionStatus::Initiated => "initiated",
            TransitionStatus::Validating => "validating",
            TransitionStatus::Applying => "applying",
            TransitionStatus::Completed => "completed",
            TransitionStatus::Failed => "failed",
            TransitionStatus::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for TransitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionStatus {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(TransitionStatus::Initiated),
            "validating" => Ok(TransitionStatus::Validating),
            "applying" => Ok(TransitionStatus::Applying),
            "completed" => Ok(TransitionStatus::Completed),
            "failed" => Ok(TransitionStatus::Failed),
            "rolled_back" => Ok(TransitionStatus::RolledBack),
            _ => Err(ParseLevelError {
                kind: "transition status",
                value: s.to_string(),
            }),
        }
    }
}

/// One entry in the transition audit trail.
///
/// Created when a transition starts and sealed when it completes, fails or
/// is rolled back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Store-assigned identifier; zero until inserted
    pub id: i64,
    pub from_level: AuthorityLevel,
    pub to_level: AuthorityLevel,
    pub kind: TransitionKind,
    pub trigger_reason: String,
    /// Quality reading when the transition started (0.0-1.0)
    pub quality_score_at_start: f64,
    /// Dependent orchestrator success rate when the transition started
    pub dependent_service_success_rate: f64,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TransitionStatus,
    /// Issues that blocked or accompanied the transition
    pub validation_snapshot: Vec<Issue>,
    pub rollback_reason: Option<String>,
    pub attempt_number: u32,
}

impl TransitionRecord {
    /// Start a new record in the `Initiated` state.
    pub fn initiate(
        from_level: AuthorityLevel,
        to_level: AuthorityLevel,
        trigger_reason: impl Into<String>,
        attempt_number: u32,
    ) -> Self {
        Self {
            id: 0,
            from_level,
            to_level,
            kind: TransitionKind::between(from_level, to_level),
            trigger_reason: trigger_reason.into(),
            quality_score_at_start: 0.0,
            dependent_service_success_rate: 0.0,
            initiated_at: Utc::now(),
            completed_at: None,
            status: TransitionStatus::Initiated,
            validation_snapshot: Vec::new(),
            rollback_reason: None,
            attempt_number,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.status.is_sealed()
    }

    /// Seal the record with a terminal status.
    pub fn seal(&mut self, status: TransitionStatus, rollback_reason: Option<String>) {
        debug_assert!(status.is_sealed());
        self.status = status;
        self.rollback_reason = rollback_reason;
        self.completed_at = Some(Utc::now());
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.initiated_at)
    }
}
