//! Rollout Monitor - Quality trends and automatic promotion
//!
//! The [`TrendMonitor`] polls the metrics source on a fixed interval, keeps a
//! 24 hour [`QualityHistory`], classifies the [`QualityTrend`] and, when
//! automation is enabled, asks the transition controller to promote once
//! every condition holds:
//!
//! - the mode state is stable and a next level exists
//! - the readiness gate passes for that level
//! - enough recent samples sit above the level's quality threshold
//! - the trend is not degrading
//! - the rolling-hour [`AutoTransitionLimiter`] has room

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod config;
mod error;
mod history;
mod limiter;
mod monitor;
mod trend;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use history::QualityHistory;
pub use limiter::AutoTransitionLimiter;
pub use monitor::{PollOutcome, TrendMonitor};
pub use trend::{classify, QualityTrend};
