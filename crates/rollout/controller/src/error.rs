//! Error types for the transition controller

use rollout_metrics::MetricsError;
use rollout_store::StoreError;
use thiserror::Error;

/// Transition error type
#[derive(Debug, Error)]
pub enum TransitionError {
    /// Readiness gate refused the target level
    #[error("Transition blocked: {}", .blockers.join("; "))]
    Blocked { blockers: Vec<String> },

    /// A pre-transition health check failed
    #[error("Health check failed: {reason}")]
    HealthCheckFailed { reason: String },

    /// Quality dropped after the switch beyond the allowed threshold
    #[error("Quality regressed from {:.1}% to {:.1}% ({drop:.1} points)", .before * 100.0, .after * 100.0)]
    QualityRegression { before: f64, after: f64, drop: f64 },

    /// Restoring the previous level failed; operator action required
    #[error("Rollback failed after '{original}': {rollback}")]
    RollbackFailed { original: String, rollback: String },

    /// The state machine is not in a state that allows the request
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Target equals the current level
    #[error("Already at the requested level")]
    NoOp,

    /// Attempt counter reached the cap
    #[error("Transition attempts exhausted ({attempts}/{max}); reset required")]
    AttemptsExceeded { attempts: u32, max: u32 },

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Metrics error
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Authority switch error
    #[error("Switch error: {0}")]
    Switch(#[source] MetricsError),
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, TransitionError>;

impl TransitionError {
    /// Whether a later attempt could succeed without operator involvement.
    pub fn is_recoverable(&self) -> bool {
        !self.requires_operator()
    }

    /// Whether an operator must act before transitions can resume.
    pub fn requires_operator(&self) -> bool {
        matches!(
            self,
            TransitionError::RollbackFailed { .. } | TransitionError::AttemptsExceeded { .. }
        )
    }

    /// Individual blocker lines, for display.
    pub fn blockers(&self) -> Vec<String> {
        match self {
            TransitionError::Blocked { blockers } => blockers.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_classification() {
        let err = TransitionError::RollbackFailed {
            original: "quality regression".into(),
            rollback: "switch down".into(),
        };
        assert!(err.requires_operator());
        assert!(!err.is_recoverable());

        assert!(TransitionError::NoOp.is_recoverable());
        assert!(TransitionError::AttemptsExceeded { attempts: 3, max: 3 }.requires_operator());
    }

    #[test]
    fn test_messages() {
        let err = TransitionError::Blocked {
            blockers: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "Transition blocked: a; b");
        assert_eq!(err.blockers().len(), 2);

        let err = TransitionError::QualityRegression {
            before: 0.8,
            after: 0.69,
            drop: 11.0,
        };
        assert_eq!(
            err.to_string(),
            "Quality regressed from 80.0% to 69.0% (11.0 points)"
        );
    }
}
