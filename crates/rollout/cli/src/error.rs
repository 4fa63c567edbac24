//! CLI error types

use rollout_controller::TransitionError;
use rollout_metrics::MetricsError;
use rollout_monitor::MonitorError;
use rollout_store::StoreError;
use rollout_types::ParseLevelError;
use rollout_validator::ValidationError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Invalid level: {0}")]
    Level(#[from] ParseLevelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The command ran but its outcome is a failure (already reported)
    #[error("{0}")]
    Unsuccessful(String),
}
