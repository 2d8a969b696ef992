//! Immutable status snapshots returned by the supervisor.

use std::time::SystemTime;

use serde::Serialize;

use crate::jobs::{JobState, Priority};

/// Point-in-time copy of one job's status and metrics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub name: String,
    pub enabled: bool,
    pub status: JobState,
    pub priority: Priority,
    pub executions: u64,
    pub errors: u64,
    /// Wall-clock time of the last successful invocation.
    pub last_execution: Option<SystemTime>,
    pub last_error: Option<String>,
    /// Rolling average over the last 100 successful invocations.
    pub avg_execution_secs: f64,
    pub last_memory_delta_mb: f64,
    /// The job's `min_interval`, in seconds.
    pub rate_limit_secs: f64,
}

/// Point-in-time copy of every job, sorted by priority then name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SupervisorSnapshot {
    pub jobs: Vec<JobSnapshot>,
    pub total_jobs: usize,
    /// Jobs currently enabled.
    pub active_jobs: usize,
}

impl SupervisorSnapshot {
    pub(crate) fn new(mut jobs: Vec<JobSnapshot>) -> Self {
        jobs.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        let active_jobs = jobs.iter().filter(|j| j.enabled).count();
        Self {
            total_jobs: jobs.len(),
            active_jobs,
            jobs,
        }
    }

    /// Looks up one job by name.
    pub fn job(&self, name: &str) -> Option<&JobSnapshot> {
        self.jobs.iter().find(|j| j.name == name)
    }
}
