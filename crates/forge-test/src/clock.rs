//! Deterministic `Clock` double.

use forge_core::clock::Clock;
use jiff::Timestamp;
use parking_lot::Mutex;

/// A `Clock` whose instant is advanced explicitly by the test, instead of
/// tracking the wall clock. Pairs with `tokio::time::pause()` for
/// deterministic debounce/stall/recovery scenarios (§8 seed scenarios 3-6).
pub struct FakeClock {
    now: Mutex<Timestamp>,
}

impl FakeClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, duration: jiff::SignedDuration) {
        let mut now = self.now.lock();
        *now += duration;
    }

    pub fn set(&self, at: Timestamp) {
        *self.now.lock() = at;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_now_forward() {
        let start = Timestamp::now();
        let clock = FakeClock::new(start);
        clock.advance(jiff::SignedDuration::from_secs(30));
        assert_eq!(clock.now(), start + jiff::SignedDuration::from_secs(30));
    }
}
