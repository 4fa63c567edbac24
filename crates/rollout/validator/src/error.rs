//! Error types for readiness validation

use rollout_metrics::MetricsError;
use rollout_store::StoreError;
use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Errors raised while gathering validation inputs
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Telemetry could not be fetched
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Store could not be inspected
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
