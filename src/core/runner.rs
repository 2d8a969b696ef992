//! # JobRunner: one job's state, metrics and single-invocation logic.
//!
//! A [`JobRunner`] owns everything the engine knows about one registered job:
//! the static [`JobSpec`], the body, the live `enabled` flag, the lifecycle
//! state and the metrics. [`JobRunner::execute`] performs at most one
//! invocation of the body.
//!
//! ## Invocation flow
//! ```text
//! execute()
//!   ├─ disabled / restarting / min_interval not elapsed → true (no-op)
//!   ├─ Running, executions += 1, publish JobStarting
//!   ├─ body.run() (panics caught)
//!   ├─ Ok  → record duration + memory delta, check budgets,
//!   │        Idle, last_run_at = now, publish JobSucceeded → true
//!   └─ Err → errors += 1, last_error, Error, publish JobFailed → false
//! ```
//!
//! ## Rules
//! - `execute` is called by the job's own loop only, so invocations never overlap.
//! - State writes after the body returns only apply while the runner is still
//!   `Running`: a concurrent `disable`, `stop` or forced restart wins.
//! - The rate limit counts from the last **successful** completion.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;

use crate::core::panic_message;
use crate::core::resources::ResourceProbe;
use crate::core::snapshot::JobSnapshot;
use crate::error::JobError;
use crate::events::{Bus, Event, EventKind};
use crate::jobs::{JobMetrics, JobRef, JobSpec, JobState, StateCell};

struct RunnerInner {
    metrics: JobMetrics,
    last_run_at: Option<Instant>,
    running_since: Option<Instant>,
}

/// Runtime wrapper of one registered job.
pub struct JobRunner {
    spec: Arc<JobSpec>,
    body: JobRef,
    enabled: AtomicBool,
    state: StateCell,
    inner: Mutex<RunnerInner>,
    bus: Bus,
    probe: Arc<dyn ResourceProbe>,
}

impl JobRunner {
    /// Creates a runner. Starts `Idle` if the spec is enabled at start, else `Paused`.
    pub fn new(spec: Arc<JobSpec>, body: JobRef, bus: Bus, probe: Arc<dyn ResourceProbe>) -> Self {
        let enabled = spec.enabled_at_start();
        let state = if enabled {
            JobState::Idle
        } else {
            JobState::Paused
        };
        Self {
            spec,
            body,
            enabled: AtomicBool::new(enabled),
            state: StateCell::new(state),
            inner: Mutex::new(RunnerInner {
                metrics: JobMetrics::default(),
                last_run_at: None,
                running_since: None,
            }),
            bus,
            probe,
        }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn state(&self) -> JobState {
        self.state.get()
    }

    /// Copy of the current metrics.
    pub fn metrics(&self) -> JobMetrics {
        self.lock().metrics.clone()
    }

    /// Runs the body once if the job is enabled and due.
    ///
    /// Returns `false` only when the body was invoked and failed.
    pub async fn execute(&self) -> bool {
        if !self.is_enabled() || self.state() == JobState::Restarting || !self.is_due() {
            return true;
        }

        let started = Instant::now();
        let execution = {
            let mut inner = self.lock();
            inner.metrics.record_start();
            inner.running_since = Some(started);
            inner.metrics.executions
        };
        self.state.set(JobState::Running);
        self.bus.publish(
            Event::new(EventKind::JobStarting)
                .with_job(self.name())
                .with_attempt(execution),
        );

        let memory_before = self.probe.memory_mb();
        let res = match AssertUnwindSafe(self.body.run()).catch_unwind().await {
            Ok(res) => res,
            Err(panic_err) => Err(JobError::Panicked {
                info: panic_message(panic_err.as_ref()),
            }),
        };
        let took = started.elapsed();

        match res {
            Ok(()) => {
                let memory_after = self.probe.memory_mb();
                {
                    let finished = Instant::now();
                    let mut inner = self.lock();
                    inner
                        .metrics
                        .record_success(finished, took, memory_after - memory_before);
                    inner.last_run_at = Some(finished);
                    inner.running_since = None;
                }
                self.check_budgets(memory_after);
                self.state.transition(JobState::Running, JobState::Idle);
                self.bus.publish(
                    Event::new(EventKind::JobSucceeded)
                        .with_job(self.name())
                        .with_attempt(execution)
                        .with_delay(took),
                );
                true
            }
            Err(e) => {
                {
                    let mut inner = self.lock();
                    inner.metrics.record_failure(e.to_string());
                    inner.running_since = None;
                }
                self.state.transition(JobState::Running, JobState::Error);
                self.bus.publish(
                    Event::new(EventKind::JobFailed)
                        .with_job(self.name())
                        .with_attempt(execution)
                        .with_reason(e.to_string()),
                );
                false
            }
        }
    }

    /// Returns false if the job is in `Error`, or `Running` for longer than `stall_timeout`.
    pub fn health_check(&self, stall_timeout: Duration) -> bool {
        match self.state() {
            JobState::Error => false,
            JobState::Running => match self.lock().running_since {
                Some(since) => since.elapsed() <= stall_timeout,
                None => true,
            },
            _ => true,
        }
    }

    /// Sets `enabled` and resets the state to `Idle`.
    ///
    /// An in-flight invocation keeps (or gets back) `Running` so that its outcome is still recorded.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
        if self.lock().running_since.is_some() {
            self.state.set(JobState::Running);
        } else {
            self.state.set_unless(&[JobState::Running], JobState::Idle);
        }
    }

    /// Clears `enabled` and parks the runner in `Paused`.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        self.state.set(JobState::Paused);
    }

    /// Parks the runner in `Paused` without touching `enabled` (engine stop).
    pub(crate) fn pause(&self) {
        self.state.set(JobState::Paused);
    }

    /// Forces `Restarting`. Returns the state it replaced.
    pub(crate) fn begin_restart(&self) -> JobState {
        let prev = self.state();
        self.state.set(JobState::Restarting);
        prev
    }

    /// Ends a forced restart. No-op if the state moved on meanwhile (e.g. disabled).
    pub(crate) fn finish_restart(&self) -> bool {
        self.state.transition(JobState::Restarting, JobState::Idle)
    }

    /// Records the end of a failed retry streak. The failed `execute` already left the runner in `Error`.
    pub(crate) fn mark_exhausted(&self, err: &JobError) {
        self.lock().metrics.last_error = Some(err.to_string());
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let metrics = self.metrics();
        JobSnapshot {
            name: self.name().to_string(),
            enabled: self.is_enabled(),
            status: self.state(),
            priority: self.spec.priority(),
            executions: metrics.executions,
            errors: metrics.errors,
            last_execution: metrics.last_execution_time(),
            last_error: metrics.last_error.clone(),
            avg_execution_secs: metrics.avg_execution_time().as_secs_f64(),
            last_memory_delta_mb: metrics.last_memory_delta_mb,
            rate_limit_secs: self.spec.min_interval().as_secs_f64(),
        }
    }

    fn is_due(&self) -> bool {
        let min_interval = self.spec.min_interval();
        if min_interval.is_zero() {
            return true;
        }
        match self.lock().last_run_at {
            Some(at) => at.elapsed() >= min_interval,
            None => true,
        }
    }

    fn check_budgets(&self, memory_mb: f64) {
        let mem_budget = self.spec.memory_budget_mb();
        if mem_budget > 0 && memory_mb > mem_budget as f64 {
            let reason = format!("memory {memory_mb:.1}MB > budget {mem_budget}MB");
            tracing::warn!(target: "jobvisor", job = %self.name(), %reason, "job over memory budget");
            self.bus.publish(
                Event::new(EventKind::BudgetExceeded)
                    .with_job(self.name())
                    .with_reason(reason)
                    .with_amount(memory_mb),
            );
        }

        let cpu_budget = self.spec.cpu_budget_percent();
        if cpu_budget > 0.0 {
            let cpu = self.probe.cpu_percent();
            if cpu > cpu_budget {
                let reason = format!("cpu {cpu:.1}% > budget {cpu_budget:.1}%");
                tracing::warn!(target: "jobvisor", job = %self.name(), %reason, "job over cpu budget");
                self.bus.publish(
                    Event::new(EventKind::BudgetExceeded)
                        .with_job(self.name())
                        .with_reason(reason)
                        .with_amount(f64::from(cpu)),
                );
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunnerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::jobs::{JobFn, Priority};
    use std::sync::atomic::AtomicU32;

    /// Fixed readings for deterministic budget checks.
    pub(crate) struct FixedProbe {
        pub memory_mb: f64,
        pub cpu_percent: f32,
    }

    impl ResourceProbe for FixedProbe {
        fn memory_mb(&self) -> f64 {
            self.memory_mb
        }
        fn cpu_percent(&self) -> f32 {
            self.cpu_percent
        }
    }

    pub(crate) fn quiet_probe() -> Arc<dyn ResourceProbe> {
        Arc::new(FixedProbe {
            memory_mb: 10.0,
            cpu_percent: 1.0,
        })
    }

    fn runner(spec: JobSpec, body: JobRef) -> (JobRunner, Bus) {
        let bus = Bus::new(64);
        let r = JobRunner::new(Arc::new(spec), body, bus.clone(), quiet_probe());
        (r, bus)
    }

    fn ok_body() -> JobRef {
        JobFn::arc(|| async { Ok::<(), JobError>(()) })
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_min_interval_is_noop() {
        let spec = JobSpec::new("a", Priority::High).with_min_interval(Duration::from_secs(60));
        let (r, _bus) = runner(spec, ok_body());

        assert!(r.execute().await);
        assert!(r.execute().await);
        assert_eq!(r.metrics().executions, 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(r.execute().await);
        assert_eq!(r.metrics().executions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn last_execution_advances_monotonically() {
        let (r, _bus) = runner(JobSpec::new("a", Priority::Low), ok_body());
        assert!(r.execute().await);
        let first = r.metrics().last_execution.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(r.execute().await);
        let second = r.metrics().last_execution.unwrap();
        assert_eq!(second.duration_since(first), Duration::from_secs(1));
        assert!(r.snapshot().last_execution.is_some());
    }

    #[test]
    fn rate_limit_keeps_sub_second_intervals() {
        let spec = JobSpec::new("fast", Priority::High).with_min_interval(Duration::from_millis(250));
        let (r, _bus) = runner(spec, ok_body());
        assert_eq!(r.snapshot().rate_limit_secs, 0.25);
    }

    #[tokio::test]
    async fn disabled_runner_is_noop() {
        let spec = JobSpec::new("gated", Priority::Low).gated();
        let (r, _bus) = runner(spec, ok_body());
        assert_eq!(r.state(), JobState::Paused);
        assert!(r.execute().await);
        assert_eq!(r.metrics().executions, 0);
    }

    #[tokio::test]
    async fn failure_and_panic_are_recorded() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let body = JobFn::arc(move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(JobError::fail("boom"))
                } else {
                    panic!("kaboom")
                }
            }
        });
        let (r, _bus) = runner(JobSpec::new("a", Priority::Low), body);

        assert!(!r.execute().await);
        assert_eq!(r.state(), JobState::Error);
        assert!(!r.execute().await);

        let m = r.metrics();
        assert_eq!(m.executions, 2);
        assert_eq!(m.errors, 2);
        assert_eq!(m.last_error.as_deref(), Some("job panicked: kaboom"));
        assert!(!r.health_check(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn enable_on_error_runner_makes_it_healthy() {
        let body = JobFn::arc(|| async { Err::<(), JobError>(JobError::fail("down")) });
        let (r, _bus) = runner(JobSpec::new("a", Priority::Low), body);
        assert!(!r.execute().await);
        assert!(!r.health_check(Duration::from_secs(300)));

        r.enable();
        assert!(r.health_check(Duration::from_secs(300)));
        assert_eq!(r.state(), JobState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn enable_during_invocation_keeps_the_failure_visible() {
        let body = JobFn::arc(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Err::<(), JobError>(JobError::fail("exchange down"))
        });
        let (r, _bus) = runner(JobSpec::new("a", Priority::Low), body);
        let r = Arc::new(r);

        let inflight = {
            let r = r.clone();
            tokio::spawn(async move { r.execute().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(r.state(), JobState::Running);

        r.enable();
        assert_eq!(r.state(), JobState::Running);
        r.disable();
        r.enable();
        assert_eq!(r.state(), JobState::Running);

        assert!(!inflight.await.unwrap());
        assert_eq!(r.state(), JobState::Error);
        assert_eq!(r.metrics().errors, 1);
        assert!(!r.health_check(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn over_budget_publishes_event() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let probe = Arc::new(FixedProbe {
            memory_mb: 80.0,
            cpu_percent: 1.0,
        });
        let spec = JobSpec::new("heavy", Priority::Low).with_budgets(50, 10.0);
        let r = JobRunner::new(Arc::new(spec), ok_body(), bus, probe);
        assert!(r.execute().await);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::JobStarting,
                EventKind::BudgetExceeded,
                EventKind::JobSucceeded
            ]
        );
        assert_eq!(r.metrics().last_memory_delta_mb, 0.0);
    }
}
