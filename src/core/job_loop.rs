//! # JobLoop: the recurring driver of one job.
//!
//! Each registered job gets one [`JobLoop`], spawned by the
//! [`Supervisor`](crate::Supervisor). It calls [`JobRunner::execute`] forever
//! and applies the job's bounded [`RetryPolicy`](crate::RetryPolicy) to failures.
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► cancelled? → break
//!   ├─► runner.execute()           (never interrupted once started)
//!   │     ├─ true  → failures = 0
//!   │     └─ false → failures += 1 → RetryPolicy::decide(failures)
//!   │                   ├─ Retry     → publish RetryScheduled, sleep(delay), next iteration
//!   │                   └─ Exhausted → publish RetryExhausted, last_error, failures = 0
//!   └─► sleep(loop_pause)
//! }
//! ```
//!
//! ## Rules
//! - Invocations of one job are strictly sequential.
//! - Cancellation is checked at **safe points** only: the top of each
//!   iteration, the retry sleep and the loop pause.
//! - After exhaustion the runner stays in `Error` and the job is attempted
//!   again on the next natural cycle (subject to `min_interval`).

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::runner::JobRunner;
use crate::error::JobError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryDecision;

/// What one iteration asks the loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Sleep the regular loop pause.
    Pause,
    /// Sleep the retry delay, then invoke again.
    Retry(Duration),
}

/// Drives one [`JobRunner`] until cancelled.
pub(crate) struct JobLoop {
    runner: Arc<JobRunner>,
    bus: Bus,
    loop_pause: Duration,
    failures: u32,
}

impl JobLoop {
    pub(crate) fn new(runner: Arc<JobRunner>, bus: Bus, loop_pause: Duration) -> Self {
        Self {
            runner,
            bus,
            loop_pause,
            failures: 0,
        }
    }

    /// Runs until `token` is cancelled. An in-flight invocation always completes first.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }
            let delay = match self.iterate().await {
                Step::Pause => self.loop_pause,
                Step::Retry(delay) => delay,
            };

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => { break; }
            }
        }
        tracing::debug!(target: "jobvisor", job = %self.runner.name(), "job loop stopped");
    }

    /// One iteration: invoke the runner and apply the retry policy.
    pub(crate) async fn iterate(&mut self) -> Step {
        if self.runner.execute().await {
            self.failures = 0;
            return Step::Pause;
        }

        self.failures += 1;
        let last = self
            .runner
            .metrics()
            .last_error
            .unwrap_or_else(|| "unknown error".to_string());

        match self.runner.spec().retry().decide(self.failures) {
            RetryDecision::Retry { retry, delay } => {
                self.bus.publish(
                    Event::new(EventKind::RetryScheduled)
                        .with_job(self.runner.name())
                        .with_attempt(u64::from(retry))
                        .with_delay(delay)
                        .with_reason(last),
                );
                Step::Retry(delay)
            }
            RetryDecision::Exhausted { attempts } => {
                let err = JobError::RetryExhausted { attempts, last };
                tracing::error!(target: "jobvisor", job = %self.runner.name(), error = %err, "retries exhausted");
                self.runner.mark_exhausted(&err);
                self.bus.publish(
                    Event::new(EventKind::RetryExhausted)
                        .with_job(self.runner.name())
                        .with_attempt(u64::from(attempts))
                        .with_reason(err.to_string()),
                );
                self.failures = 0;
                Step::Pause
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runner::tests::quiet_probe;
    use crate::jobs::{JobFn, JobSpec, JobState, Priority};
    use crate::policies::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(fail_first: u32) -> crate::jobs::JobRef {
        let calls = Arc::new(AtomicU32::new(0));
        JobFn::arc(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < fail_first {
                    Err(JobError::fail(format!("attempt {n}")))
                } else {
                    Ok(())
                }
            }
        })
    }

    fn job_loop(spec: JobSpec, fail_first: u32) -> (JobLoop, Arc<JobRunner>) {
        let bus = Bus::new(64);
        let runner = Arc::new(JobRunner::new(
            Arc::new(spec),
            flaky(fail_first),
            bus.clone(),
            quiet_probe(),
        ));
        (
            JobLoop::new(runner.clone(), bus, Duration::from_secs(1)),
            runner,
        )
    }

    #[tokio::test]
    async fn fails_twice_then_succeeds_within_retry_budget() {
        let spec = JobSpec::new("flaky", Priority::Medium)
            .with_retry(RetryPolicy::new(2, Duration::from_secs(5)));
        let (mut lp, runner) = job_loop(spec, 2);

        assert_eq!(lp.iterate().await, Step::Retry(Duration::from_secs(5)));
        assert_eq!(lp.iterate().await, Step::Retry(Duration::from_secs(5)));
        assert_eq!(lp.iterate().await, Step::Pause);

        let m = runner.metrics();
        assert_eq!(m.executions, 3);
        assert_eq!(m.errors, 2);
        assert_eq!(runner.state(), JobState::Idle);
    }

    #[tokio::test]
    async fn exhaustion_leaves_error_and_resets_streak() {
        let spec = JobSpec::new("down", Priority::Low)
            .with_retry(RetryPolicy::new(1, Duration::from_millis(10)));
        let (mut lp, runner) = job_loop(spec, u32::MAX);

        assert!(matches!(lp.iterate().await, Step::Retry(_)));
        assert_eq!(lp.iterate().await, Step::Pause);
        assert_eq!(runner.state(), JobState::Error);
        assert_eq!(
            runner.metrics().last_error.as_deref(),
            Some("retries exhausted after 2 attempts: execution failed: attempt 1")
        );

        // next natural cycle starts a fresh streak
        assert!(matches!(lp.iterate().await, Step::Retry(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let (lp, runner) = job_loop(JobSpec::new("ok", Priority::Low), 0);
        let token = CancellationToken::new();
        let handle = tokio::spawn(lp.run(token.clone()));

        time::sleep(Duration::from_millis(2500)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(runner.metrics().executions, 3);
    }
}
