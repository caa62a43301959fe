//! Monotonic time and bounded polling.
//!
//! Early boot has no scheduler, no interrupts and no sleep primitive: every
//! "did the hardware finish?" check is a busy poll against a free-running
//! counter. [`poll_until`] is the one place that loop is written.
//!
//! # Termination
//!
//! A poll ends on the first of:
//! 1. the predicate returning `true`,
//! 2. the clock reaching `start + policy.timeout`,
//! 3. `policy.max_polls` predicate evaluations.
//!
//! (3) is the backstop for a clock that has stopped or was never started:
//! the loop still terminates after a bounded number of register reads.
//!
//! Not to be confused with DRAM command-to-command delays, which the DDR2
//! controller enforces itself once a command batch has been issued.

use embassy_time::{Duration, Instant};

/// Monotonic elapsed-time source.
///
/// On the target this is the MIPS core timer widened to 64 bits; in tests it
/// is [`crate::mocks::FakeClock`].
pub trait Monotonic {
    /// Current instant. Must never go backwards.
    fn now(&self) -> Instant;
}

impl<C: Monotonic + ?Sized> Monotonic for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Bounds applied to one [`poll_until`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollPolicy {
    /// Wall-clock bound measured with the [`Monotonic`] source.
    pub timeout: Duration,
    /// Maximum number of predicate evaluations. Always at least one poll is made.
    pub max_polls: u32,
}

impl PollPolicy {
    /// Wall-clock bound used for every hardware wait during bring-up (1 s).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_000);

    /// Poll budget backstop. At ~100 ns per uncached register read this is
    /// several seconds, comfortably past [`Self::DEFAULT_TIMEOUT`].
    pub const DEFAULT_MAX_POLLS: u32 = 50_000_000;

    /// Policy with the given timeout and the default poll budget.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            max_polls: Self::DEFAULT_MAX_POLLS,
        }
    }

    /// Replace the poll budget.
    #[must_use]
    pub const fn max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }
}

/// Result of a bounded poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// The predicate became true after `polls` evaluations.
    Ready {
        /// Number of predicate evaluations, including the successful one.
        polls: u32,
    },
    /// The deadline or the poll budget ran out first.
    TimedOut {
        /// Number of predicate evaluations made.
        polls: u32,
        /// Time elapsed on the monotonic clock when the poll gave up.
        elapsed: Duration,
    },
}

impl PollOutcome {
    /// `true` if the predicate was satisfied.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Number of predicate evaluations made.
    pub fn polls(&self) -> u32 {
        match *self {
            Self::Ready { polls } | Self::TimedOut { polls, .. } => polls,
        }
    }
}

/// Busy-poll `done` until it returns `true` or `policy` is exhausted.
///
/// The predicate is evaluated at least once, before the clock is consulted,
/// so hardware that is already finished never costs a timeout.
pub fn poll_until<C, F>(clock: &C, policy: PollPolicy, mut done: F) -> PollOutcome
where
    C: Monotonic + ?Sized,
    F: FnMut() -> bool,
{
    let start = clock.now();
    // A deadline that overflows the tick counter is as good as no deadline;
    // the poll budget still bounds the loop.
    let deadline = start.checked_add(policy.timeout);
    let mut polls: u32 = 0;

    loop {
        polls = polls.saturating_add(1);
        if done() {
            return PollOutcome::Ready { polls };
        }

        let now = clock.now();
        let expired = deadline.is_some_and(|deadline| now >= deadline);
        if expired || polls >= policy.max_polls {
            return PollOutcome::TimedOut {
                polls,
                elapsed: now.saturating_duration_since(start),
            };
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::mocks::FakeClock;

    #[test]
    fn ready_on_first_poll_does_not_wait() {
        let clock = FakeClock::frozen(Instant::from_ticks(0));
        let outcome = poll_until(&clock, PollPolicy::default(), || true);
        assert_eq!(outcome, PollOutcome::Ready { polls: 1 });
    }

    #[test]
    fn ready_after_several_polls() {
        let clock = FakeClock::stepping(Duration::from_micros(1));
        let mut remaining = 3;
        let outcome = poll_until(&clock, PollPolicy::default(), || {
            remaining -= 1;
            remaining == 0
        });
        assert_eq!(outcome, PollOutcome::Ready { polls: 3 });
    }

    #[test]
    fn deadline_expires_on_advancing_clock() {
        let clock = FakeClock::stepping(Duration::from_millis(100));
        let policy = PollPolicy::with_timeout(Duration::from_millis(1_000));
        let outcome = poll_until(&clock, policy, || false);
        match outcome {
            PollOutcome::TimedOut { polls, elapsed } => {
                assert_eq!(polls, 10);
                assert!(elapsed >= Duration::from_millis(1_000));
            }
            PollOutcome::Ready { .. } => panic!("predicate never succeeds"),
        }
    }

    #[test]
    fn frozen_clock_is_bounded_by_poll_budget() {
        let clock = FakeClock::frozen(Instant::from_ticks(42));
        let policy = PollPolicy::default().max_polls(500);
        let outcome = poll_until(&clock, policy, || false);
        assert_eq!(
            outcome,
            PollOutcome::TimedOut {
                polls: 500,
                elapsed: Duration::from_ticks(0),
            }
        );
    }

    #[test]
    fn zero_budget_still_polls_once() {
        let clock = FakeClock::frozen(Instant::from_ticks(0));
        let mut calls = 0;
        let outcome = poll_until(&clock, PollPolicy::default().max_polls(0), || {
            calls += 1;
            false
        });
        assert_eq!(calls, 1);
        assert!(!outcome.is_ready());
        assert_eq!(outcome.polls(), 1);
    }

    #[test]
    fn deadline_overflow_falls_back_to_budget() {
        let clock = FakeClock::frozen(Instant::from_ticks(u64::MAX - 1));
        let policy = PollPolicy::with_timeout(Duration::from_secs(10)).max_polls(7);
        let outcome = poll_until(&clock, policy, || false);
        assert_eq!(outcome.polls(), 7);
    }
}
