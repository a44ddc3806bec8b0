//! Single-slot debounce deadline.
//!
//! Arming replaces any pending deadline, so only the last request in a
//! burst survives the quiet period. A pending deadline is never dropped,
//! only superseded. The type is pure data over caller-supplied instants;
//! the session loop owns the actual waiting.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// Schedule (or reschedule) the deferred action one quiet period from
    /// `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// When an armed deadline has passed, disarm and return true. The
    /// caller performs the deferred action exactly once per fire.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// **Feature: debounced-persistence, Property: a burst of arms yields exactly one fire**
    ///
    /// N arms each closer together than the quiet period coalesce into a
    /// single fire one quiet period after the last arm; arms farther apart
    /// each fire on their own.
    proptest! {
        #[test]
        fn prop_burst_coalesces_into_one_fire(
            gaps_ms in prop::collection::vec(0u64..9_999, 1..20),
        ) {
            let quiet = Duration::from_millis(10_000);
            let mut debouncer = Debouncer::new(quiet);
            let start = Instant::now();

            let mut now = start;
            let mut fires = 0;
            for gap in &gaps_ms {
                now += Duration::from_millis(*gap);
                if debouncer.fire_if_due(now) {
                    fires += 1;
                }
                debouncer.arm(now);
            }
            // every gap was shorter than the quiet period, so nothing fired
            prop_assert_eq!(fires, 0);
            prop_assert!(debouncer.fire_if_due(now + quiet));
            prop_assert!(!debouncer.is_armed());
        }

        #[test]
        fn prop_spaced_arms_each_fire(
            gaps_ms in prop::collection::vec(10_000u64..30_000, 1..20),
        ) {
            let quiet = Duration::from_millis(10_000);
            let mut debouncer = Debouncer::new(quiet);
            let start = Instant::now();

            let mut now = start;
            let mut fires = 0;
            for gap in &gaps_ms {
                debouncer.arm(now);
                now += Duration::from_millis(*gap);
                if debouncer.fire_if_due(now) {
                    fires += 1;
                }
            }
            prop_assert_eq!(fires, gaps_ms.len());
        }
    }
}
