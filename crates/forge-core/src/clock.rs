//! Monotonic time and debounce primitives (component C1).

use jiff::{SignedDuration, Timestamp};

/// Source of the current instant.
///
/// Abstracted behind a trait so tests can drive the health monitor,
/// autoscaler, and recovery logic with `tokio::time::pause` instead of real
/// wall-clock sleeps (see `forge-test::clock`).
pub trait Clock: Send + Sync + 'static {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// `Clock` backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Tracks the last time an action fired, for the debounce rule used by the
/// autoscaler (§4.7 rule 1) and by any other periodic loop that must not
/// act more often than some minimum interval.
#[derive(Debug, Clone, Copy)]
pub struct Debounce {
    last_action: Option<Timestamp>,
    min_interval: SignedDuration,
}

impl Debounce {
    pub fn new(min_interval: SignedDuration) -> Self {
        Self {
            last_action: None,
            min_interval,
        }
    }

    /// Returns `true` if an action is allowed to fire now; if so, records
    /// `now` as the new last-action instant.
    pub fn try_fire(&mut self, now: Timestamp) -> bool {
        if let Some(last) = self.last_action {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_action = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_blocks_within_interval_and_allows_after() {
        let mut debounce = Debounce::new(SignedDuration::from_secs(10));
        let t0 = Timestamp::now();

        assert!(debounce.try_fire(t0));
        assert!(!debounce.try_fire(t0 + SignedDuration::from_secs(5)));
        assert!(debounce.try_fire(t0 + SignedDuration::from_secs(11)));
    }
}
