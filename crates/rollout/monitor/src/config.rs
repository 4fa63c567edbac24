//! Trend monitor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the trend monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll interval in seconds
    pub poll_interval_secs: u64,

    /// How long quality samples are retained (hours)
    pub history_retention_hours: i64,

    /// Samples per trend window; the trend compares two adjacent windows
    pub trend_window: usize,

    /// Mean difference (percentage points) that counts as a trend
    pub trend_threshold_points: f64,

    /// Window in which quality must hold above the target threshold (seconds)
    pub stability_window_secs: i64,

    /// Samples above threshold required inside the stability window
    pub min_stable_samples: usize,

    /// Automatic transitions allowed in any rolling hour
    pub max_auto_transitions_per_hour: usize,

    /// Invoke the controller when every auto-promotion condition holds
    pub auto_transition: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            history_retention_hours: 24,
            trend_window: 5,
            trend_threshold_points: 2.0,
            stability_window_secs: 300,
            min_stable_samples: 3,
            max_auto_transitions_per_hour: 2,
            auto_transition: false,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.history_retention_hours)
    }

    pub fn stability_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stability_window_secs)
    }
}
