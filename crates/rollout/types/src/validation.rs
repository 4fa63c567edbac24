//! Validation results: issues, stage results, readiness report and gate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Blocks readiness outright
    Critical,
    /// Lowers the score but does not block
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Critical => write!(f, "critical"),
            IssueSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// A single finding, tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub stage: String,
    pub severity: IssueSeverity,
    pub message: String,
}

impl Issue {
    pub fn critical(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            severity: IssueSeverity::Critical,
            message: message.into(),
        }
    }

    pub fn warning(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == IssueSeverity::Critical
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.stage, self.message)
    }
}

/// Outcome of one validation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pass,
    Warning,
    Fail,
    /// The stage could not run; excluded from the overall score
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Pass => write!(f, "pass"),
            StageStatus::Warning => write!(f, "warning"),
            StageStatus::Fail => write!(f, "fail"),
            StageStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of a single validation stage. Produced fresh on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStageResult {
    pub name: String,
    pub status: StageStatus,
    /// Score in `0.0..=100.0`
    pub score: f64,
    pub issues: Vec<Issue>,
    pub raw_metrics: BTreeMap<String, f64>,
}

impl ValidationStageResult {
    /// Build a result, deriving the status from the issues.
    pub fn from_issues(
        name: impl Into<String>,
        score: f64,
        issues: Vec<Issue>,
        raw_metrics: BTreeMap<String, f64>,
    ) -> Self {
        let status = if issues.iter().any(Issue::is_critical) {
            StageStatus::Fail
        } else if issues.is_empty() {
            StageStatus::Pass
        } else {
            StageStatus::Warning
        };

        Self {
            name: name.into(),
            status,
            score: score.clamp(0.0, 100.0),
            issues,
            raw_metrics,
        }
    }

    /// A stage that could not be evaluated.
    pub fn errored(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            issues: vec![Issue::warning(
                name.clone(),
                format!("stage could not run: {}", reason.into()),
            )],
            name,
            status: StageStatus::Error,
            score: 0.0,
            raw_metrics: BTreeMap::new(),
        }
    }

    pub fn critical_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_critical()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.critical_count()
    }
}

/// Overall verdict of the six-stage report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Ready,
    NeedsImprovement,
    NotReady,
    /// No stage could be evaluated
    Error,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Ready => write!(f, "READY"),
            OverallStatus::NeedsImprovement => write!(f, "NEEDS IMPROVEMENT"),
            OverallStatus::NotReady => write!(f, "NOT READY"),
            OverallStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Six-stage readiness report for human-facing diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub overall_status: OverallStatus,
    /// Weighted score in `0.0..=100.0`
    pub readiness_score: f64,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub stages: BTreeMap<String, ValidationStageResult>,
    pub generated_at: DateTime<Utc>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.overall_status == OverallStatus::Ready
    }
}

/// Verdict of the narrow per-level readiness gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessGate {
    pub ready: bool,
    pub blockers: Vec<String>,
}

impl ReadinessGate {
    pub fn from_blockers(blockers: Vec<String>) -> Self {
        Self {
            ready: blockers.is_empty(),
            blockers,
        }
    }

    /// Blockers as critical issues attributed to `stage`.
    pub fn to_issues(&self, stage: &str) -> Vec<Issue> {
        self.blockers
            .iter()
            .map(|b| Issue::critical(stage, b.clone()))
            .collect()
    }
}
