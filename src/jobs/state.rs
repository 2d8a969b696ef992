//! # Job lifecycle state.
//!
//! ```text
//!            execute()              ok
//!   Idle ───────────────► Running ──────► Idle
//!    ▲                       │
//!    │                       │ err
//!    │ enable()              ▼
//!    ├──────────────────── Error
//!    │                       │ unhealthy (health monitor)
//!    │  grace elapsed        ▼
//!    └─────────────────── Restarting
//!
//!   disable() / stop()  → Paused (from any state)
//!   enable()            → Idle   (from any state but Running)
//! ```
//!
//! [`StateCell`] stores the state in an atomic so that snapshots and the
//! health monitor can read it without touching the runner's metrics lock.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Lifecycle state of a job runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum JobState {
    /// Ready for the next invocation.
    Idle = 0,
    /// An invocation is in flight.
    Running = 1,
    /// The last invocation (or retry streak) failed.
    Error = 2,
    /// Forced restart in progress; the loop skips invocations.
    Restarting = 3,
    /// Disabled or engine stopped.
    Paused = 4,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Error => "error",
            JobState::Restarting => "restarting",
            JobState::Paused => "paused",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => JobState::Idle,
            1 => JobState::Running,
            2 => JobState::Error,
            3 => JobState::Restarting,
            _ => JobState::Paused,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder of a [`JobState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: JobState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn get(&self) -> JobState {
        JobState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: JobState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Sets `to` unless the current state is one of `keep`. Returns the previous state.
    pub(crate) fn set_unless(&self, keep: &[JobState], to: JobState) -> JobState {
        let prev = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (!keep.contains(&JobState::from_u8(cur))).then_some(to as u8)
            })
            .unwrap_or_else(|cur| cur);
        JobState::from_u8(prev)
    }

    /// Sets `to` only if the current state is `from`. Returns true on success.
    pub(crate) fn transition(&self, from: JobState, to: JobState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_only_from_expected_state() {
        let cell = StateCell::new(JobState::Restarting);
        assert!(!cell.transition(JobState::Running, JobState::Idle));
        assert_eq!(cell.get(), JobState::Restarting);
        assert!(cell.transition(JobState::Restarting, JobState::Idle));
        assert_eq!(cell.get(), JobState::Idle);
    }

    #[test]
    fn set_unless_leaves_kept_states_alone() {
        let cell = StateCell::new(JobState::Running);
        assert_eq!(cell.set_unless(&[JobState::Running], JobState::Idle), JobState::Running);
        assert_eq!(cell.get(), JobState::Running);

        cell.set(JobState::Error);
        assert_eq!(cell.set_unless(&[JobState::Running], JobState::Idle), JobState::Error);
        assert_eq!(cell.get(), JobState::Idle);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&JobState::Restarting).unwrap();
        assert_eq!(json, "\"restarting\"");
    }
}
