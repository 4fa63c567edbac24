//! Quality trend classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of recent quality movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityTrend {
    Improving,
    #[default]
    Stable,
    Degrading,
}

impl QualityTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTrend::Improving => "improving",
            QualityTrend::Stable => "stable",
            QualityTrend::Degrading => "degrading",
        }
    }
}

impl fmt::Display for QualityTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compare the mean of the last `window` readings with the `window` before.
///
/// Readings are fractions; `threshold_points` is in percentage points.
/// Fewer than `2 * window` readings is always `Stable`.
pub fn classify(qualities: &[f64], window: usize, threshold_points: f64) -> QualityTrend {
    if window == 0 || qualities.len() < window * 2 {
        return QualityTrend::Stable;
    }

    let end = qualities.len();
    let recent = mean(&qualities[end - window..]);
    let previous = mean(&qualities[end - 2 * window..end - window]);
    let delta = (recent - previous) * 100.0;

    if delta > threshold_points {
        QualityTrend::Improving
    } else if delta < -threshold_points {
        QualityTrend::Degrading
    } else {
        QualityTrend::Stable
    }
}
