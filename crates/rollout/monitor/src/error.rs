//! Error types for the trend monitor

use rollout_controller::TransitionError;
use rollout_metrics::MetricsError;
use rollout_store::StoreError;
use thiserror::Error;

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Monitor error type
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Metrics could not be fetched this poll
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Mode state could not be read
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Controller rejected a state read
    #[error("Controller error: {0}")]
    Controller(#[from] TransitionError),
}
