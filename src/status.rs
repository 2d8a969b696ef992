//! # Aggregated engine status.
//!
//! [`StatusReporter`] combines the supervisor snapshot, the threshold states
//! and process readings into one serializable [`StatusReport`]. It owns no
//! state of its own and never mutates anything.
//!
//! ## Example
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use jobvisor::{StatusReporter, Supervisor, ThresholdController};
//! # async fn demo(sup: Arc<Supervisor>, ctl: Arc<ThresholdController>) {
//! let reporter = StatusReporter::new(sup, ctl);
//! let report = reporter.report().await;
//! println!("{} of {} jobs active", report.active_jobs, report.total_jobs);
//! # }
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::core::{JobSnapshot, Supervisor};
use crate::thresholds::{ThresholdController, ThresholdStatus};

/// Point-in-time engine report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    pub uptime_secs: u64,
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub process_memory_mb: f64,
    pub process_cpu_percent: f32,
    /// Sorted by priority then name.
    pub jobs: Vec<JobSnapshot>,
    /// Ascending by amount.
    pub thresholds: Vec<ThresholdStatus>,
    pub total_executions: u64,
    pub total_errors: u64,
    pub error_rate_percent: f64,
}

/// Read-only aggregation over a supervisor and its threshold controller.
pub struct StatusReporter {
    supervisor: Arc<Supervisor>,
    thresholds: Arc<ThresholdController>,
}

impl StatusReporter {
    pub fn new(supervisor: Arc<Supervisor>, thresholds: Arc<ThresholdController>) -> Self {
        Self {
            supervisor,
            thresholds,
        }
    }

    pub async fn report(&self) -> StatusReport {
        let snapshot = self.supervisor.status_snapshot();
        let thresholds = self.thresholds.thresholds().await;
        let probe = self.supervisor.probe();

        let total_executions: u64 = snapshot.jobs.iter().map(|j| j.executions).sum();
        let total_errors: u64 = snapshot.jobs.iter().map(|j| j.errors).sum();
        let error_rate_percent = if total_executions == 0 {
            0.0
        } else {
            total_errors as f64 / total_executions as f64 * 100.0
        };

        StatusReport {
            uptime_secs: self.supervisor.uptime().as_secs(),
            total_jobs: snapshot.total_jobs,
            active_jobs: snapshot.active_jobs,
            process_memory_mb: probe.memory_mb(),
            process_cpu_percent: probe.cpu_percent(),
            jobs: snapshot.jobs,
            thresholds,
            total_executions,
            total_errors,
            error_rate_percent,
        }
    }
}
