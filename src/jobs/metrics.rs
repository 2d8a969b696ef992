//! # Per-job execution metrics.
//!
//! Counters are lifetime totals. The average execution time is computed over
//! the last [`EXECUTION_WINDOW`] successful invocations only.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

/// Number of recent successful durations kept for the rolling average.
pub const EXECUTION_WINDOW: usize = 100;

/// Counters and timings of one job.
#[derive(Clone, Debug, Default)]
pub struct JobMetrics {
    /// Invocations started (successful or not).
    pub executions: u64,
    /// Failed invocations.
    pub errors: u64,
    /// Completion of the last successful invocation (monotonic clock).
    pub last_execution: Option<Instant>,
    /// Message of the last failure.
    pub last_error: Option<String>,
    /// Process memory change across the last successful invocation, in MB.
    pub last_memory_delta_mb: f64,
    durations: VecDeque<Duration>,
}

impl JobMetrics {
    /// Mean of the retained durations (`0` before the first success).
    pub fn avg_execution_time(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.durations.iter().sum();
        total / self.durations.len() as u32
    }

    /// Wall-clock time of the last successful invocation, for display.
    pub fn last_execution_time(&self) -> Option<SystemTime> {
        self.last_execution
            .and_then(|at| SystemTime::now().checked_sub(at.elapsed()))
    }

    /// Number of durations currently retained.
    pub fn samples(&self) -> usize {
        self.durations.len()
    }

    /// Error share of all executions, in percent.
    pub fn error_rate_percent(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.errors as f64 / self.executions as f64 * 100.0
        }
    }

    pub(crate) fn record_start(&mut self) {
        self.executions += 1;
    }

    pub(crate) fn record_success(&mut self, at: Instant, took: Duration, memory_delta_mb: f64) {
        if self.durations.len() == EXECUTION_WINDOW {
            self.durations.pop_front();
        }
        self.durations.push_back(took);
        self.last_execution = Some(at);
        self.last_memory_delta_mb = memory_delta_mb;
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        self.errors += 1;
        self.last_error = Some(message);
    }
}
