//! # Delay between retries of a failed job.
//!
//! [`BackoffPolicy`] turns a retry number into a delay:
//! `first × factor^retry`, clamped to `max`, then jittered.
//! With the default `factor = 1.0` the delay is constant, which is the plain
//! "wait `retry_delay` between attempts" behaviour.
//!
//! The base is derived from the retry number alone, so jitter output never
//! feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use jobvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy::exponential(Duration::from_secs(5), 2.0, Duration::from_secs(60));
//! assert_eq!(backoff.next(0), Duration::from_secs(5));
//! assert_eq!(backoff.next(2), Duration::from_secs(20));
//! assert_eq!(backoff.next(10), Duration::from_secs(60));
//!
//! let flat = BackoffPolicy::constant(Duration::from_secs(5));
//! assert_eq!(flat.next(7), Duration::from_secs(5));
//! assert_eq!(flat.jitter, JitterPolicy::None);
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry delay policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth per retry (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied to the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 5s delay, no jitter.
    fn default() -> Self {
        Self::constant(Duration::from_secs(5))
    }
}

impl BackoffPolicy {
    /// Same delay before every retry.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay grows by `factor` per retry, capped at `max`.
    pub fn exponential(first: Duration, factor: f64, max: Duration) -> Self {
        Self {
            first,
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns the policy with a different jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay before retry number `retry` (0-indexed).
    pub fn next(&self, retry: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = retry.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_policy_never_changes() {
        let policy = BackoffPolicy::constant(Duration::from_millis(500));
        for retry in 0..10 {
            assert_eq!(policy.next(retry), Duration::from_millis(500));
        }
    }

    #[test]
    fn exponential_growth_is_capped() {
        let policy =
            BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(1));
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(3), Duration::from_millis(800));
        assert_eq!(policy.next(4), Duration::from_secs(1));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn zero_delay_stays_zero_under_jitter() {
        let policy = BackoffPolicy::constant(Duration::ZERO).with_jitter(JitterPolicy::Equal);
        assert_eq!(policy.next(3), Duration::ZERO);
    }

    #[test]
    fn equal_jitter_keeps_at_least_half() {
        let policy =
            BackoffPolicy::constant(Duration::from_secs(2)).with_jitter(JitterPolicy::Equal);
        for retry in 0..50 {
            let d = policy.next(retry);
            assert!(d >= Duration::from_secs(1), "retry {retry}: {d:?}");
            assert!(d <= Duration::from_secs(2), "retry {retry}: {d:?}");
        }
    }
}
