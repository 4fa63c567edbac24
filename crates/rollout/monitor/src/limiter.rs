//! Rolling-hour cap on automatic transitions

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Sliding-window counter of automatic transitions.
#[derive(Debug, Clone)]
pub struct AutoTransitionLimiter {
    max_per_window: usize,
    window: Duration,
    fired: VecDeque<DateTime<Utc>>,
}

impl AutoTransitionLimiter {
    /// Cap of `max_per_hour` in any rolling hour
    pub fn per_hour(max_per_hour: usize) -> Self {
        Self {
            max_per_window: max_per_hour,
            window: Duration::hours(1),
            fired: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        while self
            .fired
            .front()
            .is_some_and(|t| now - *t >= self.window)
        {
            self.fired.pop_front();
        }
    }

    /// Transitions fired in the window ending at `now`
    pub fn count(&mut self, now: DateTime<Utc>) -> usize {
        self.prune(now);
        self.fired.len()
    }

    pub fn allows(&mut self, now: DateTime<Utc>) -> bool {
        self.count(now) < self.max_per_window
    }

    /// Record a transition at `now` if the cap allows it.
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.allows(now) {
            return false;
        }
        self.fired.push_back(now);
        true
    }

    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cap_and_release() {
        let base = Utc::now();
        let mut limiter = AutoTransitionLimiter::per_hour(2);

        assert!(limiter.try_acquire(base));
        assert!(limiter.try_acquire(base + Duration::minutes(10)));
        assert!(!limiter.try_acquire(base + Duration::minutes(59)));

        assert!(limiter.try_acquire(base + Duration::minutes(60)));
        assert!(!limiter.try_acquire(base + Duration::minutes(65)));
        assert!(limiter.try_acquire(base + Duration::minutes(70)));
    }

    #[test]
    fn test_zero_cap_never_allows() {
        let mut limiter = AutoTransitionLimiter::per_hour(0);
        assert!(!limiter.try_acquire(Utc::now()));
    }

    proptest! {
        #[test]
        fn property_never_exceeds_cap_in_any_rolling_hour(
            cap in 1usize..5,
            gaps in prop::collection::vec(0i64..1800, 1..60),
        ) {
            let base = Utc::now();
            let mut limiter = AutoTransitionLimiter::per_hour(cap);
            let mut now = base;
            let mut accepted = Vec::new();

            for gap in gaps {
                now += Duration::seconds(gap);
                if limiter.try_acquire(now) {
                    accepted.push(now);
                }
            }

            for (i, start) in accepted.iter().enumerate() {
                let in_window = accepted[i..]
                    .iter()
                    .take_while(|t| **t - *start < Duration::hours(1))
                    .count();
                prop_assert!(in_window <= cap);
            }
        }
    }
}
