//! # Supervisor: owns the job registry, runs the loops, exposes control and status.
//!
//! The [`Supervisor`] is built once by [`SupervisorBuilder`](crate::SupervisorBuilder)
//! from a validated [`Catalog`](crate::Catalog) and the registered bodies.
//! Its registry key set never changes afterwards.
//!
//! ## High-level architecture
//! ```text
//! start():
//!   runtime token ──► child token per loop
//!   JoinSet:
//!     JobLoop[job 0] ── JobRunner::execute ──┐
//!     JobLoop[job 1] ── JobRunner::execute ──┤
//!     ...                                    ├── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!     HealthMonitor  ── health_check/restart ┘                          └─► Bus::subscribe() (user code)
//!
//!   waits for: runtime token cancelled (stop)  → drain JoinSet → Ok
//!              JoinError from any loop         → cancel all, drain → Err(Fatal)
//!   then: every runner Paused, publish AllStopped
//!
//! stop():
//!   publish ShutdownRequested → cancel runtime token → every runner Paused
//!   → wait until start() has drained
//! ```
//!
//! ## Rules
//! - Cancellation never interrupts an in-flight invocation; `stop()` returns
//!   only once every loop has observed it.
//! - `enable`/`disable` work whether or not the engine is running.
//! - Job failures never leave their loop; only [`EngineError::Fatal`] leaves `start()`.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use jobvisor::{Catalog, EngineConfig, JobError, JobFn, LogWriter, SupervisorBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), jobvisor::EngineError> {
//!     let sup = SupervisorBuilder::new(EngineConfig::default(), Catalog::default())
//!         .with_subscribers(vec![Arc::new(LogWriter::new())])
//!         .register("bounty_hunter", JobFn::arc(|| async { Ok::<(), JobError>(()) }))?
//!         .build();
//!
//!     sup.run_until_signal().await
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::health::HealthMonitor;
use crate::core::job_loop::JobLoop;
use crate::core::resources::ResourceProbe;
use crate::core::runner::JobRunner;
use crate::core::shutdown;
use crate::core::snapshot::{JobSnapshot, SupervisorSnapshot};
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::jobs::{Catalog, unlock_message};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Lifecycle of the engine as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Built, never started.
    Idle,
    /// `start()` is running its loops (or draining them).
    Running,
    /// `start()` returned.
    Stopped,
}

/// Owns the job runners and drives their loops.
pub struct Supervisor {
    cfg: EngineConfig,
    catalog: Catalog,
    bus: Bus,
    runners: BTreeMap<String, Arc<JobRunner>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    probe: Arc<dyn ResourceProbe>,
    token: Mutex<Option<CancellationToken>>,
    run_state: watch::Sender<RunState>,
    created_at: std::time::Instant,
}

impl Supervisor {
    pub(crate) fn new_internal(
        cfg: EngineConfig,
        catalog: Catalog,
        bus: Bus,
        runners: BTreeMap<String, Arc<JobRunner>>,
        subscribers: Vec<Arc<dyn Subscribe>>,
        probe: Arc<dyn ResourceProbe>,
    ) -> Self {
        let (run_state, _rx) = watch::channel(RunState::Idle);
        Self {
            cfg,
            catalog,
            bus,
            runners,
            subscribers,
            probe,
            token: Mutex::new(None),
            run_state,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Event bus shared by every component of this engine.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Receiver for all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub fn run_state(&self) -> RunState {
        *self.run_state.borrow()
    }

    /// Time since the supervisor was built.
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn probe(&self) -> &Arc<dyn ResourceProbe> {
        &self.probe
    }

    /// Registered job names, in name order.
    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.runners.keys().map(String::as_str)
    }

    /// Looks up a registered runner.
    pub fn runner(&self, name: &str) -> Result<&Arc<JobRunner>, EngineError> {
        self.runners.get(name).ok_or_else(|| EngineError::UnknownJob {
            name: name.to_string(),
        })
    }

    /// Enables a job and returns its unlock message.
    pub fn enable(&self, name: &str) -> Result<String, EngineError> {
        let runner = self.runner(name)?;
        runner.enable();
        let message = unlock_message(name);
        self.bus.publish(
            Event::new(EventKind::JobEnabled)
                .with_job(name)
                .with_reason(message.as_str()),
        );
        Ok(message)
    }

    /// Disables a job. An in-flight invocation finishes; no new one starts.
    pub fn disable(&self, name: &str) -> Result<(), EngineError> {
        let runner = self.runner(name)?;
        runner.disable();
        self.bus
            .publish(Event::new(EventKind::JobDisabled).with_job(name));
        Ok(())
    }

    /// Runs every job loop and the health monitor until [`stop`](Self::stop)
    /// or a fatal loop failure.
    ///
    /// Returns [`EngineError::AlreadyStarted`] if the engine is running.
    pub async fn start(&self) -> Result<(), EngineError> {
        let token = self.claim_start()?;
        tracing::info!(target: "jobvisor", jobs = self.runners.len(), "supervisor starting");

        let listener = self.subscriber_listener();

        let mut set = JoinSet::new();
        for runner in self.runners.values() {
            let job_loop = JobLoop::new(Arc::clone(runner), self.bus.clone(), self.cfg.loop_pause);
            set.spawn(job_loop.run(token.child_token()));
        }
        let monitor = HealthMonitor::new(
            self.runners.values().cloned().collect(),
            self.cfg.clone(),
            self.bus.clone(),
            Arc::clone(&self.probe),
        );
        set.spawn(monitor.run(token.child_token()));

        let res = self.drive(&mut set, &token).await;

        for runner in self.runners.values() {
            runner.pause();
        }
        self.bus.publish(Event::new(EventKind::AllStopped));
        if let Some(listener) = listener {
            let _ = listener.await;
        }

        if let Err(e) = &res {
            tracing::error!(target: "jobvisor", error = %e, label = e.as_label(), "supervisor stopped on fatal error");
        } else {
            tracing::info!(target: "jobvisor", "supervisor stopped");
        }
        self.run_state.send_replace(RunState::Stopped);
        res
    }

    /// Requests a graceful stop and waits until every loop has drained.
    ///
    /// Returns immediately if the engine is not running.
    pub async fn stop(&self) {
        let token = match self.lock_token().clone() {
            Some(token) if self.run_state() == RunState::Running => token,
            _ => return,
        };

        if !token.is_cancelled() {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
            token.cancel();
        }
        for runner in self.runners.values() {
            runner.pause();
        }

        let mut rx = self.run_state.subscribe();
        let _ = rx.wait_for(|s| *s != RunState::Running).await;
    }

    /// Starts the engine and stops it gracefully on SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere).
    pub async fn run_until_signal(&self) -> Result<(), EngineError> {
        let engine = self.start();
        tokio::pin!(engine);

        tokio::select! {
            res = &mut engine => return res,
            sig = shutdown::wait_for_shutdown_signal() => {
                if let Err(e) = sig {
                    tracing::warn!(target: "jobvisor", error = %e, "cannot listen for signals, running until stopped");
                    return engine.await;
                }
            }
        }

        let (res, ()) = tokio::join!(engine, self.stop());
        res
    }

    /// Copy of every registered job's status, sorted by priority then name.
    pub fn status_snapshot(&self) -> SupervisorSnapshot {
        SupervisorSnapshot::new(self.runners.values().map(|r| r.snapshot()).collect())
    }

    /// Copy of one job's status.
    pub fn job_status(&self, name: &str) -> Result<JobSnapshot, EngineError> {
        Ok(self.runner(name)?.snapshot())
    }

    fn claim_start(&self) -> Result<CancellationToken, EngineError> {
        let mut guard = self.lock_token();
        if self.run_state() == RunState::Running {
            return Err(EngineError::AlreadyStarted);
        }
        let token = CancellationToken::new();
        *guard = Some(token.clone());
        self.run_state.send_replace(RunState::Running);

        for runner in self.runners.values() {
            if runner.is_enabled() {
                runner.enable();
            }
        }
        Ok(token)
    }

    /// Waits for cancellation or the first loop failure, then drains the set.
    async fn drive(
        &self,
        set: &mut JoinSet<()>,
        token: &CancellationToken,
    ) -> Result<(), EngineError> {
        let mut fatal: Option<String> = None;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                joined = set.join_next() => match joined {
                    Some(Err(e)) => {
                        fatal = Some(join_failure(e));
                        token.cancel();
                        break;
                    }
                    Some(Ok(())) => continue,
                    None => break,
                },
            }
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                fatal.get_or_insert_with(|| join_failure(e));
            }
        }

        match fatal {
            Some(reason) => Err(EngineError::Fatal { reason }),
            None => Ok(()),
        }
    }

    /// Forwards bus events to the subscriber set until `AllStopped`.
    fn subscriber_listener(&self) -> Option<tokio::task::JoinHandle<()>> {
        if self.subscribers.is_empty() {
            return None;
        }
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());

        Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let last = ev.kind == EventKind::AllStopped;
                        set.emit(&ev);
                        if last {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(target: "jobvisor", skipped, "subscriber listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        }))
    }

    fn lock_token(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn join_failure(e: tokio::task::JoinError) -> String {
    if e.is_panic() {
        format!(
            "loop panicked: {}",
            crate::core::panic_message(e.into_panic().as_ref())
        )
    } else {
        format!("loop aborted: {e}")
    }
}
