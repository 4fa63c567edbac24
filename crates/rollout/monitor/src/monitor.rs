//! Trend monitor: polls quality, classifies the trend and drives
//! rate-limited automatic promotion through the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rollout_controller::TransitionController;
use rollout_metrics::MetricsSource;
use rollout_store::RolloutStore;
use rollout_types::{AuthorityLevel, MetricsSnapshot, ModeState, QualitySample, RolloutEvent};
use rollout_validator::{evaluate_transition_readiness, GateContext, LevelRequirements};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::history::QualityHistory;
use crate::limiter::AutoTransitionLimiter;
use crate::trend::{classify, QualityTrend};

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    /// Another poll was already running
    Skipped,
    /// Sample recorded; automation disabled
    Observed { quality: f64, trend: QualityTrend },
    /// Automation evaluated and declined
    Held {
        quality: f64,
        trend: QualityTrend,
        reason: String,
    },
    /// Automatic promotion completed
    Promoted {
        from: AuthorityLevel,
        to: AuthorityLevel,
    },
    /// Automatic promotion was attempted and failed
    PromotionFailed { to: AuthorityLevel, error: String },
}

struct MonitorState {
    history: QualityHistory,
    limiter: AutoTransitionLimiter,
    trend: QualityTrend,
}

/// Clears the in-flight flag when a poll ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Quality trend monitor
pub struct TrendMonitor {
    config: MonitorConfig,
    controller: Arc<TransitionController>,
    metrics: Arc<dyn MetricsSource>,
    store: Arc<dyn RolloutStore>,
    state: Mutex<MonitorState>,
    in_flight: AtomicBool,
}

impl TrendMonitor {
    pub fn new(
        config: MonitorConfig,
        controller: Arc<TransitionController>,
        metrics: Arc<dyn MetricsSource>,
        store: Arc<dyn RolloutStore>,
    ) -> Self {
        let state = MonitorState {
            history: QualityHistory::new(config.retention()),
            limiter: AutoTransitionLimiter::per_hour(config.max_auto_transitions_per_hour),
            trend: QualityTrend::Stable,
        };
        Self {
            config,
            controller,
            metrics,
            store,
            state: Mutex::new(state),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Current classified trend
    pub async fn trend(&self) -> QualityTrend {
        self.state.lock().await.trend
    }

    /// Retained samples, oldest first
    pub async fn history(&self) -> Vec<QualitySample> {
        self.state.lock().await.history.to_vec()
    }

    /// Poll once at the current time.
    pub async fn poll(&self) -> MonitorResult<PollOutcome> {
        self.poll_at(Utc::now()).await
    }

    /// Poll once, treating `now` as the sample time.
    #[instrument(skip(self))]
    pub async fn poll_at(&self, now: DateTime<Utc>) -> MonitorResult<PollOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Poll already in flight, skipping");
            return Ok(PollOutcome::Skipped);
        }
        let _in_flight = InFlight(&self.in_flight);

        let snapshot = self.metrics.fetch().await?;
        let mut sample = snapshot.to_sample();
        sample.timestamp = now;

        if let Err(e) = self.store.record_quality_sample(&sample).await {
            warn!(error = %e, "Failed to persist quality sample");
        }

        // Store I/O stays outside the state lock.
        let automation = if self.config.auto_transition {
            Some((
                self.controller.state().await,
                self.store.health_check().await.is_ok(),
            ))
        } else {
            None
        };

        let mut state = self.state.lock().await;
        state.history.push(sample);

        let trend = classify(
            &state.history.qualities(),
            self.config.trend_window,
            self.config.trend_threshold_points,
        );
        if trend != state.trend {
            info!(from = %state.trend, to = %trend, quality = snapshot.quality, "Quality trend changed");
            self.controller.events().emit(RolloutEvent::TrendChanged {
                from: state.trend.to_string(),
                to: trend.to_string(),
            });
            state.trend = trend;
        }
        debug!(
            quality = snapshot.quality,
            trend = %trend,
            samples = state.history.len(),
            "Quality sampled"
        );

        let Some((mode, store_healthy)) = automation else {
            return Ok(PollOutcome::Observed {
                quality: snapshot.quality,
                trend,
            });
        };
        let mode = mode?;

        let decision = self.auto_transition_target(&mut state, &mode, store_healthy, &snapshot, now);
        let (from, target) = match decision {
            Ok(levels) => levels,
            Err(reason) => {
                debug!(reason = %reason, "Automatic transition held");
                self.controller
                    .events()
                    .emit(RolloutEvent::AutoTransitionSkipped {
                        reason: reason.clone(),
                    });
                return Ok(PollOutcome::Held {
                    quality: snapshot.quality,
                    trend,
                    reason,
                });
            }
        };

        state.limiter.try_acquire(now);
        drop(state);

        info!(from = %from, to = %target, quality = snapshot.quality, "Triggering automatic transition");
        self.controller
            .events()
            .emit(RolloutEvent::AutoTransitionTriggered {
                from,
                to: target,
                quality: snapshot.quality,
            });

        let reason = format!(
            "automatic: quality {:.1}% held above the {} threshold",
            snapshot.quality * 100.0,
            target
        );
        match self.controller.execute_transition(target, &reason).await {
            Ok(_) => Ok(PollOutcome::Promoted { from, to: target }),
            Err(e) => {
                warn!(to = %target, error = %e, "Automatic transition failed");
                Ok(PollOutcome::PromotionFailed {
                    to: target,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Check every automation condition; `Err(reason)` names the first that fails.
    fn auto_transition_target(
        &self,
        state: &mut MonitorState,
        mode: &ModeState,
        store_healthy: bool,
        snapshot: &MetricsSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(AuthorityLevel, AuthorityLevel), String> {
        if !mode.is_stable() {
            return Err(format!(
                "transition phase is {}",
                mode.transition_phase
            ));
        }

        let from = mode.current_level;
        let Some(target) = from.next() else {
            return Err(format!("already at {}", from));
        };

        let gate = evaluate_transition_readiness(
            snapshot,
            target,
            &GateContext {
                store_healthy,
                transition_attempts: mode.transition_attempts,
                max_attempts: self.controller.config().max_transition_attempts,
            },
        );
        if !gate.ready {
            return Err(format!(
                "readiness gate for {}: {}",
                target,
                gate.blockers.join("; ")
            ));
        }

        let threshold = LevelRequirements::quality_threshold(target);
        let stable = state
            .history
            .count_at_or_above(now - self.config.stability_window(), threshold);
        if stable < self.config.min_stable_samples {
            return Err(format!(
                "{} of {} samples at or above {:.0}% in the stability window",
                stable,
                self.config.min_stable_samples,
                threshold * 100.0
            ));
        }

        if state.trend == QualityTrend::Degrading {
            return Err("quality trend is degrading".to_string());
        }

        if !state.limiter.allows(now) {
            return Err(format!(
                "hourly limit of {} automatic transitions reached",
                state.limiter.max_per_window()
            ));
        }

        Ok((from, target))
    }

    /// Poll on a fixed interval until `shutdown` turns true or is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.poll_interval_secs,
            auto_transition = self.config.auto_transition,
            "Trend monitor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll().await {
                        Ok(outcome) => debug!(?outcome, "Poll finished"),
                        Err(e) => warn!(error = %e, "Poll failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Trend monitor stopped");
    }
}
