//! # HealthMonitor: periodic stall detection and memory watch.
//!
//! Every `health_interval` the monitor:
//! 1. calls [`JobRunner::health_check`] on each runner; an unhealthy one is
//!    forced to `Restarting`, left there for `restart_grace`, then set `Idle`;
//! 2. compares process memory with `memory_ceiling_mb` and publishes
//!    `MemoryPressure` when above it (a hint only, nothing is killed);
//! 3. every `metrics_log_every` cycles, logs a per-job summary ordered by priority.
//!
//! The monitor never interrupts a body. A stalled invocation keeps running in
//! its own loop; the forced restart only resets the state seen by reporting
//! and by the next health pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::resources::ResourceProbe;
use crate::core::runner::JobRunner;
use crate::events::{Bus, Event, EventKind};

pub(crate) struct HealthMonitor {
    runners: Vec<Arc<JobRunner>>,
    cfg: EngineConfig,
    bus: Bus,
    probe: Arc<dyn ResourceProbe>,
    cycle: u64,
}

impl HealthMonitor {
    pub(crate) fn new(
        runners: Vec<Arc<JobRunner>>,
        cfg: EngineConfig,
        bus: Bus,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self {
        Self {
            runners,
            cfg,
            bus,
            probe,
            cycle: 0,
        }
    }

    pub(crate) async fn run(mut self, token: CancellationToken) {
        loop {
            if !sleep_or_cancel(self.cfg.health_interval, &token).await {
                break;
            }
            if !self.pass(&token).await {
                break;
            }
        }
        tracing::debug!(target: "jobvisor", "health monitor stopped");
    }

    /// One health cycle. Returns false if cancelled mid-way.
    pub(crate) async fn pass(&mut self, token: &CancellationToken) -> bool {
        self.cycle += 1;

        let unhealthy: Vec<_> = self
            .runners
            .iter()
            .filter(|r| !r.health_check(self.cfg.stall_timeout))
            .cloned()
            .collect();

        if !unhealthy.is_empty() {
            for runner in &unhealthy {
                let prev = runner.begin_restart();
                tracing::warn!(target: "jobvisor", job = %runner.name(), previous = %prev, "unhealthy job, forcing restart");
                self.bus.publish(
                    Event::new(EventKind::JobRestarting)
                        .with_job(runner.name())
                        .with_reason(prev.as_str()),
                );
            }
            let completed = sleep_or_cancel(self.cfg.restart_grace, token).await;
            for runner in &unhealthy {
                if runner.finish_restart() {
                    tracing::info!(target: "jobvisor", job = %runner.name(), "job restarted");
                    self.bus
                        .publish(Event::new(EventKind::JobRestarted).with_job(runner.name()));
                }
            }
            if !completed {
                return false;
            }
        }

        self.check_memory();
        if self.cfg.metrics_due(self.cycle) {
            self.log_summary();
        }
        true
    }

    fn check_memory(&self) {
        let Some(ceiling) = self.cfg.memory_ceiling() else {
            return;
        };
        let memory_mb = self.probe.memory_mb();
        if memory_mb > ceiling as f64 {
            tracing::warn!(target: "jobvisor", memory_mb, ceiling_mb = ceiling, "process memory above ceiling, reclaim advised");
            self.bus.publish(
                Event::new(EventKind::MemoryPressure)
                    .with_reason(format!("memory {memory_mb:.1}MB > ceiling {ceiling}MB"))
                    .with_amount(memory_mb),
            );
        }
    }

    fn log_summary(&self) {
        let mut runners: Vec<_> = self.runners.iter().collect();
        runners.sort_by(|a, b| {
            a.spec()
                .priority()
                .cmp(&b.spec().priority())
                .then_with(|| a.name().cmp(b.name()))
        });

        tracing::info!(
            target: "jobvisor",
            memory_mb = self.probe.memory_mb(),
            cpu_percent = self.probe.cpu_percent(),
            "metrics summary"
        );
        for r in runners {
            let m = r.metrics();
            tracing::info!(
                target: "jobvisor",
                job = %r.name(),
                priority = %r.spec().priority(),
                status = %r.state(),
                executions = m.executions,
                errors = m.errors,
                avg_secs = m.avg_execution_time().as_secs_f64(),
                memory_delta_mb = m.last_memory_delta_mb,
                "job metrics"
            );
        }
    }
}

/// Sleeps for `d`. Returns false if `token` fired first.
async fn sleep_or_cancel(d: Duration, token: &CancellationToken) -> bool {
    select! {
        _ = time::sleep(d) => true,
        _ = token.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runner::tests::FixedProbe;
    use crate::jobs::{JobFn, JobSpec, JobState, Priority};

    fn monitor(runners: Vec<Arc<JobRunner>>, bus: Bus, memory_mb: f64) -> HealthMonitor {
        let cfg = EngineConfig {
            stall_timeout: Duration::from_secs(300),
            restart_grace: Duration::from_secs(5),
            memory_ceiling_mb: 300,
            ..EngineConfig::default()
        };
        let probe = Arc::new(FixedProbe {
            memory_mb,
            cpu_percent: 0.0,
        });
        HealthMonitor::new(runners, cfg, bus, probe)
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_job_is_restarted_without_new_execution() {
        let bus = Bus::new(64);
        let body = JobFn::arc(|| async {
            time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });
        let runner = Arc::new(JobRunner::new(
            Arc::new(JobSpec::new("stuck", Priority::High)),
            body,
            bus.clone(),
            Arc::new(FixedProbe {
                memory_mb: 1.0,
                cpu_percent: 0.0,
            }),
        ));

        let r = runner.clone();
        let _inflight = tokio::spawn(async move { r.execute().await });
        tokio::task::yield_now().await;
        assert_eq!(runner.state(), JobState::Running);

        time::advance(Duration::from_secs(301)).await;
        assert!(!runner.health_check(Duration::from_secs(300)));

        let mut hm = monitor(vec![runner.clone()], bus, 1.0);
        let token = CancellationToken::new();
        let pass = tokio::spawn(async move { hm.pass(&token).await });
        tokio::task::yield_now().await;
        assert_eq!(runner.state(), JobState::Restarting);

        assert!(pass.await.unwrap());
        assert_eq!(runner.state(), JobState::Idle);
        assert_eq!(runner.metrics().executions, 1);
    }

    #[tokio::test]
    async fn memory_above_ceiling_publishes_pressure() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let mut hm = monitor(vec![], bus, 512.0);

        assert!(hm.pass(&CancellationToken::new()).await);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::MemoryPressure);
        assert_eq!(ev.amount, Some(512.0));
    }
}
