//! Authority levels and transition phases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Degree of operational authority granted to the governed component.
///
/// Levels are totally ordered. A transition moves forward one level or back
/// to the immediately prior level; skipping is never allowed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    /// Component runs alongside the pipeline, decisions are not applied.
    #[default]
    Observing,
    /// Component drives a subset of decisions.
    Partial,
    /// Component drives the pipeline.
    Full,
}

impl AuthorityLevel {
    pub const ALL: [AuthorityLevel; 3] = [
        AuthorityLevel::Observing,
        AuthorityLevel::Partial,
        AuthorityLevel::Full,
    ];

    /// The level one step above, if any.
    pub fn next(&self) -> Option<AuthorityLevel> {
        match self {
            AuthorityLevel::Observing => Some(AuthorityLevel::Partial),
            AuthorityLevel::Partial => Some(AuthorityLevel::Full),
            AuthorityLevel::Full => None,
        }
    }

    /// The level one step below, if any.
    pub fn previous(&self) -> Option<AuthorityLevel> {
        match self {
            AuthorityLevel::Observing => None,
            AuthorityLevel::Partial => Some(AuthorityLevel::Observing),
            AuthorityLevel::Full => Some(AuthorityLevel::Partial),
        }
    }

    /// True when `other` is exactly one step away from `self`.
    pub fn is_adjacent(&self, other: AuthorityLevel) -> bool {
        self.next() == Some(other) || self.previous() == Some(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityLevel::Observing => "observing",
            AuthorityLevel::Partial => "partial",
            AuthorityLevel::Full => "full",
        }
    }
}

impl fmt::Display for AuthorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level or phase string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseLevelError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for AuthorityLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "observing" | "observe" | "shadow" => Ok(AuthorityLevel::Observing),
            "partial" => Ok(AuthorityLevel::Partial),
            "full" => Ok(AuthorityLevel::Full),
            _ => Err(ParseLevelError {
                kind: "authority level",
                value: s.to_string(),
            }),
        }
    }
}

/// Phase of the mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    /// No transition in flight; a new one may start.
    #[default]
    Stable,
    /// A transition is being validated or applied.
    Transitioning,
    /// A failed transition is being reverted, or a revert failed.
    RollingBack,
}

impl TransitionPhase {
    pub fn is_stable(&self) -> bool {
        matches!(self, TransitionPhase::Stable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::Stable => "stable",
            TransitionPhase::Transitioning => "transitioning",
            TransitionPhase::RollingBack => "rolling_back",
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionPhase {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(TransitionPhase::Stable),
            "transitioning" => Ok(TransitionPhase::Transitioning),
            "rolling_back" => Ok(TransitionPhase::RollingBack),
            _ => Err(ParseLevelError {
                kind: "transition phase",
                value: s.to_string(),
            }),
        }
    }
}
