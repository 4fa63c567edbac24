//! Error types for collaborator clients

use thiserror::Error;

/// Result type for collaborator calls
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors raised while talking to external collaborators
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from a collaborator
    #[error("{endpoint} returned status {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Response body could not be interpreted
    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// Call did not complete in time
    #[error("Timed out calling {0}")]
    Timeout(String),

    /// Collaborator not configured or deliberately unavailable
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The authority switch refused or failed to apply a level
    #[error("Authority switch failed: {0}")]
    Switch(String),
}

impl MetricsError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            MetricsError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MetricsError::Status { status, .. } => *status >= 500 || *status == 429,
            MetricsError::Timeout(_) => true,
            MetricsError::InvalidResponse { .. }
            | MetricsError::Unavailable(_)
            | MetricsError::Switch(_) => false,
        }
    }
}
