//! # jobvisor
//!
//! **Jobvisor** is a supervision engine for a fixed set of recurring jobs.
//!
//! Each job is an opaque async (or blocking) body run forever on its own loop,
//! with a minimum interval between invocations, a bounded retry policy and
//! soft resource budgets. A health monitor restarts stalled or failed jobs,
//! and a threshold controller enables gated jobs once a balance crosses
//! configured amounts.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Catalog (JobSpecs + ThresholdSpecs)      registered bodies
//!            │                                     │
//!            └──────────► SupervisorBuilder ◄──────┘
//!                               │ build()
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - frozen registry: name → JobRunner (spec, state, metrics, body) │
//! │  - Bus (broadcast events)                                         │
//! │  - enable / disable / status_snapshot / job_status                │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐   ┌─────────────┐
//!   │ JobLoop  │       │ JobLoop  │       │ JobLoop  │   │HealthMonitor│
//!   │(retries) │       │(retries) │       │(retries) │   │(stall, mem) │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘   └──────┬──────┘
//!        └──────────────────┴─────── publish ──┴────────────────┘
//!                                      ▼
//!                        Bus ──► listener ──► SubscriberSet ──► LogWriter, ...
//!
//!   BalanceProvider ──► ThresholdController ── enable(job) ──► Supervisor
//!                                └── notify(message) ──► Notify
//!
//!   StatusReporter = status_snapshot + thresholds + process readings
//! ```
//!
//! ### Job loop
//! ```text
//! loop {
//!   ├─► cancelled? → exit
//!   ├─► JobRunner::execute()
//!   │     ├─ disabled / not due / restarting → no-op
//!   │     ├─ Ok  → Idle, metrics, JobSucceeded
//!   │     └─ Err → Error, errors += 1, JobFailed
//!   ├─► failed and retries left → RetryScheduled, sleep(retry delay), again
//!   ├─► failed and retries spent → RetryExhausted, wait for next cycle
//!   └─► sleep(loop_pause) (cancellable)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types                               |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------|
//! | **Jobs**          | Static specs, bodies, state and metrics                       | [`JobSpec`], [`JobFn`], [`JobState`]    |
//! | **Supervision**   | Loops, bounded retry, stall recovery, graceful drain          | [`Supervisor`], [`SupervisorBuilder`]   |
//! | **Policies**      | Retry count and delay between attempts                        | [`RetryPolicy`], [`BackoffPolicy`]      |
//! | **Thresholds**    | Balance-driven unlocking of gated jobs                        | [`ThresholdController`], [`Notify`]     |
//! | **Observability** | Events, subscribers, status reports                           | [`Event`], [`Subscribe`], [`StatusReporter`] |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use jobvisor::{
//!     Catalog, EngineConfig, JobError, JobFn, LogNotifier, LogWriter, StaticBalance,
//!     SupervisorBuilder, ThresholdController,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = SupervisorBuilder::new(EngineConfig::default(), Catalog::default())
//!         .with_subscribers(vec![Arc::new(LogWriter::new())])
//!         .register("bounty_hunter", JobFn::arc(|| async {
//!             tokio::time::sleep(Duration::from_millis(200)).await;
//!             Ok::<(), JobError>(())
//!         }))?
//!         .register("rwa_monitor", JobFn::arc(|| async { Ok::<(), JobError>(()) }))?
//!         .build();
//!
//!     let thresholds = Arc::new(ThresholdController::new(sup.clone(), Arc::new(LogNotifier::new())));
//!     let balance = Arc::new(StaticBalance::new(750.0));
//!     let token = CancellationToken::new();
//!     let poller = {
//!         let thresholds = thresholds.clone();
//!         let token = token.clone();
//!         tokio::spawn(async move { thresholds.run(balance, token).await })
//!     };
//!
//!     sup.run_until_signal().await?;
//!     token.cancel();
//!     poller.await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod status;

pub mod events;
pub mod jobs;
pub mod policies;
pub mod subscribers;
pub mod thresholds;

// ---- Public re-exports ----

pub use config::EngineConfig;
pub use crate::core::{
    JobRunner, JobSnapshot, ResourceProbe, RunState, Supervisor, SupervisorBuilder,
    SupervisorSnapshot, SysinfoProbe,
};
pub use error::{BalanceError, EngineError, JobError, NotifyError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{
    BlockingFn, Catalog, JobBody, JobFn, JobKind, JobMetrics, JobRef, JobSpec, JobState,
    Priority, ThresholdSpec,
};
pub use policies::{BackoffPolicy, JitterPolicy, RetryDecision, RetryPolicy};
pub use status::{StatusReport, StatusReporter};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use thresholds::{
    BalanceProvider, LogNotifier, Notify, StaticBalance, ThresholdController, ThresholdStatus,
    Unlock,
};
