//! Property-based tests for bounded polling.
//!
//! Run with: cargo test -p platform --test poll_proptest

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use core::cell::Cell;

use embassy_time::{Duration, Instant};
use platform::{poll_until, Monotonic, PollOutcome, PollPolicy};
use proptest::prelude::*;

/// Advances by `step_us` on every read.
struct Ticking {
    now_us: Cell<u64>,
    step_us: u64,
}

impl Monotonic for Ticking {
    fn now(&self) -> Instant {
        let t = self.now_us.get();
        self.now_us.set(t + self.step_us);
        Instant::from_micros(t)
    }
}

fn clock(step_us: u64) -> Ticking {
    Ticking {
        now_us: Cell::new(0),
        step_us,
    }
}

proptest! {
    /// A predicate that turns true within budget is reported with the exact
    /// number of evaluations.
    #[test]
    fn ready_counts_every_poll(ready_at in 1u32..500, budget in 500u32..1_000) {
        let mut calls = 0u32;
        let policy = PollPolicy::with_timeout(Duration::from_secs(3_600)).max_polls(budget);
        let outcome = poll_until(&clock(1), policy, || {
            calls += 1;
            calls == ready_at
        });
        prop_assert_eq!(outcome, PollOutcome::Ready { polls: ready_at });
    }

    /// A stopped clock cannot hold the loop past its poll budget.
    #[test]
    fn stopped_clock_is_bounded_by_budget(budget in 1u32..2_000) {
        let mut calls = 0u32;
        let policy = PollPolicy::with_timeout(Duration::from_millis(1)).max_polls(budget);
        let outcome = poll_until(&clock(0), policy, || {
            calls += 1;
            false
        });
        prop_assert!(!outcome.is_ready());
        prop_assert_eq!(outcome.polls(), budget);
        prop_assert_eq!(calls, budget);
    }

    /// A running clock ends the wait at the deadline, well inside the budget.
    #[test]
    fn deadline_ends_wait(timeout_us in 10u64..1_000, step_us in 1u64..10) {
        let policy = PollPolicy::with_timeout(Duration::from_micros(timeout_us));
        let outcome = poll_until(&clock(step_us), policy, || false);
        match outcome {
            PollOutcome::TimedOut { polls, elapsed } => {
                prop_assert!(elapsed >= Duration::from_micros(timeout_us));
                prop_assert!(u64::from(polls) <= timeout_us / step_us + 1);
            }
            PollOutcome::Ready { .. } => prop_assert!(false, "never-true predicate reported ready"),
        }
    }
}
