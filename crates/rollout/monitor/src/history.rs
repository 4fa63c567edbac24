//! Bounded quality history

use chrono::{DateTime, Duration, Utc};
use rollout_types::QualitySample;
use std::collections::VecDeque;

/// Time-bounded sample history, oldest first.
///
/// Samples older than the retention window (measured from the newest
/// insert) are evicted on every push.
#[derive(Debug, Clone)]
pub struct QualityHistory {
    samples: VecDeque<QualitySample>,
    retention: Duration,
}

impl QualityHistory {
    pub fn new(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Append a sample and evict everything outside the retention window.
    pub fn push(&mut self, sample: QualitySample) {
        let cutoff = sample.timestamp - self.retention;
        self.samples.push_back(sample);
        while self
            .samples
            .front()
            .is_some_and(|oldest| oldest.timestamp < cutoff)
        {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&QualitySample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualitySample> {
        self.samples.iter()
    }

    /// Quality readings, oldest first
    pub fn qualities(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.quality).collect()
    }

    /// Samples at or after `since` with quality at or above `threshold`
    pub fn count_at_or_above(&self, since: DateTime<Utc>, threshold: f64) -> usize {
        self.samples
            .iter()
            .filter(|s| s.timestamp >= since && s.quality >= threshold)
            .count()
    }

    pub fn to_vec(&self) -> Vec<QualitySample> {
        self.samples.iter().cloned().collect()
    }
}
