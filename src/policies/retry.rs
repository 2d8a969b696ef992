//! # Bounded retry policy.
//!
//! [`RetryPolicy`] decides what a job loop does after a failed invocation:
//!
//! ```text
//! failure #n in the current streak
//!   ├─ n <= max_retries  → RetryDecision::Retry { retry: n, delay: backoff.next(n - 1) }
//!   └─ n >  max_retries  → RetryDecision::Exhausted { attempts: n }
//! ```
//!
//! A success resets the streak. Exhaustion resets it too: the runner moves to
//! `Error` and the job is attempted again on the next natural loop cycle.

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Bounded retry policy of a job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial failed attempt (`0` = no retry).
    pub max_retries: u32,
    /// Delay between attempts.
    pub backoff: BackoffPolicy,
}

/// Outcome of [`RetryPolicy::decide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`. `retry` is 1-based.
    Retry { retry: u32, delay: Duration },
    /// Give up for this cycle. `attempts` counts the initial attempt too.
    Exhausted { attempts: u32 },
}

impl Default for RetryPolicy {
    /// 3 retries, constant 5s delay.
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// `max_retries` retries with a constant `delay`.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffPolicy::constant(delay),
        }
    }

    /// Returns the policy with a different backoff.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// The delay before the first retry.
    pub fn retry_delay(&self) -> Duration {
        self.backoff.first
    }

    /// Decides after the `failures`-th consecutive failure (1-based).
    pub fn decide(&self, failures: u32) -> RetryDecision {
        if failures == 0 || failures > self.max_retries {
            RetryDecision::Exhausted {
                attempts: failures.max(1),
            }
        } else {
            RetryDecision::Retry {
                retry: failures,
                delay: self.backoff.next(failures - 1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_then_exhausts() {
        let policy = RetryPolicy::new(2, Duration::from_secs(5));
        assert_eq!(
            policy.decide(1),
            RetryDecision::Retry {
                retry: 1,
                delay: Duration::from_secs(5)
            }
        );
        assert_eq!(
            policy.decide(2),
            RetryDecision::Retry {
                retry: 2,
                delay: Duration::from_secs(5)
            }
        );
        assert_eq!(policy.decide(3), RetryDecision::Exhausted { attempts: 3 });
    }

    #[test]
    fn zero_retries_exhausts_immediately() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.decide(1), RetryDecision::Exhausted { attempts: 1 });
    }
}
