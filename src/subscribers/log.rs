//! # LogWriter: renders engine events through `tracing`.
//!
//! Severity follows the event: failures and pressure are `warn`, exhausted
//! retries and subscriber panics are `error`, routine lifecycle is `debug`,
//! control-plane changes are `info`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG jobvisor: starting job="trading_bot" execution=12
//!  WARN jobvisor: failed job="trading_bot" execution=12 err="execution failed: timeout"
//!  WARN jobvisor: retry job="trading_bot" retry=1 delay_ms=5000
//! ERROR jobvisor: retries exhausted job="trading_bot" attempts=4 err="..."
//!  INFO jobvisor: unlocked job="rwa_monitor" amount=500
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let job = e.job.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::JobStarting => {
                debug!(target: "jobvisor", job, execution = ?e.attempt, "starting");
            }
            EventKind::JobSucceeded => {
                debug!(target: "jobvisor", job, execution = ?e.attempt, took_ms = ?e.delay_ms, "succeeded");
            }
            EventKind::JobFailed => {
                warn!(target: "jobvisor", job, execution = ?e.attempt, err = reason, "failed");
            }
            EventKind::BudgetExceeded => {
                warn!(target: "jobvisor", job, detail = reason, "over budget");
            }
            EventKind::RetryScheduled => {
                warn!(target: "jobvisor", job, retry = ?e.attempt, delay_ms = ?e.delay_ms, err = reason, "retry");
            }
            EventKind::RetryExhausted => {
                error!(target: "jobvisor", job, attempts = ?e.attempt, err = reason, "retries exhausted");
            }
            EventKind::JobEnabled => {
                info!(target: "jobvisor", job, "enabled");
            }
            EventKind::JobDisabled => {
                info!(target: "jobvisor", job, "disabled");
            }
            EventKind::ThresholdUnlocked => {
                info!(target: "jobvisor", job, amount = ?e.amount, "unlocked");
            }
            EventKind::JobRestarting => {
                warn!(target: "jobvisor", job, from = reason, "restarting");
            }
            EventKind::JobRestarted => {
                info!(target: "jobvisor", job, "restarted");
            }
            EventKind::MemoryPressure => {
                warn!(target: "jobvisor", memory_mb = ?e.amount, detail = reason, "memory pressure");
            }
            EventKind::ShutdownRequested => {
                info!(target: "jobvisor", "shutdown requested");
            }
            EventKind::AllStopped => {
                info!(target: "jobvisor", "all jobs stopped");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "jobvisor", subscriber = job, detail = reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "jobvisor", subscriber = job, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
