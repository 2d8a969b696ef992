//! # Static job specification.
//!
//! [`JobSpec`] describes how one named job is scheduled: its reporting
//! priority, rate limit, soft resource budgets, retry policy and whether it
//! is enabled when the engine starts. Specs are part of the static
//! [`Catalog`](crate::Catalog) and never change after startup; the live
//! enabled flag is owned by the job's runner.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use jobvisor::{JobSpec, Priority, RetryPolicy};
//!
//! let spec = JobSpec::new("rwa_monitor", Priority::High)
//!     .with_min_interval(Duration::from_secs(60))
//!     .with_budgets(30, 5.0)
//!     .with_retry(RetryPolicy::new(3, Duration::from_secs(5)))
//!     .gated();
//!
//! assert!(!spec.enabled_at_start());
//! assert_eq!(spec.min_interval(), Duration::from_secs(60));
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::policies::RetryPolicy;

/// Reporting priority. Lower ordinal sorts first; never used for preemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Specification of one recurring job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSpec {
    name: String,
    priority: Priority,
    min_interval: Duration,
    memory_budget_mb: u64,
    cpu_budget_percent: f32,
    retry: RetryPolicy,
    enabled: bool,
}

impl JobSpec {
    /// Creates an enabled spec with no rate limit, no budgets and the default retry policy.
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            priority,
            min_interval: Duration::ZERO,
            memory_budget_mb: 0,
            cpu_budget_percent: 0.0,
            retry: RetryPolicy::default(),
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Minimum time between two invocations of the body.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Soft memory budget in MB (`0` = none).
    pub fn memory_budget_mb(&self) -> u64 {
        self.memory_budget_mb
    }

    /// Soft CPU budget in percent (`0` = none).
    pub fn cpu_budget_percent(&self) -> f32 {
        self.cpu_budget_percent
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Whether the job runs as soon as the engine starts.
    pub fn enabled_at_start(&self) -> bool {
        self.enabled
    }

    /// Returns a new spec with updated rate limit.
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Returns a new spec with updated soft budgets.
    pub fn with_budgets(mut self, memory_mb: u64, cpu_percent: f32) -> Self {
        self.memory_budget_mb = memory_mb;
        self.cpu_budget_percent = cpu_percent;
        self
    }

    /// Returns a new spec with updated retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a new spec that starts disabled (unlocked later by a threshold).
    pub fn gated(mut self) -> Self {
        self.enabled = false;
        self
    }
}
