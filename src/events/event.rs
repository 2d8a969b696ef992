//! # Runtime events emitted by the engine.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Invocation events**: one job invocation (starting, succeeded, failed, budget)
//! - **Retry events**: bounded retry flow (scheduled, exhausted)
//! - **Control events**: enable/disable, threshold unlocks, health restarts
//! - **Engine events**: memory pressure, shutdown, subscriber problems
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use jobvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_job("trading_bot")
//!     .with_reason("exchange timeout")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.job.as_deref(), Some("trading_bot"));
//! assert_eq!(ev.delay_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Invocation events ===
    /// A job body is about to be invoked.
    ///
    /// Sets: `job`, `attempt` (lifetime execution count)
    JobStarting,

    /// A job body completed successfully.
    ///
    /// Sets: `job`, `attempt`, `delay_ms` (execution duration)
    JobSucceeded,

    /// A job body failed (error or panic).
    ///
    /// Sets: `job`, `attempt`, `reason`
    JobFailed,

    /// Process memory or CPU exceeded the job's soft budget after an invocation.
    ///
    /// Sets: `job`, `reason`
    BudgetExceeded,

    // === Retry events ===
    /// A retry of a failed job is scheduled.
    ///
    /// Sets: `job`, `attempt` (retry number, 1-based), `delay_ms`, `reason`
    RetryScheduled,

    /// The retry budget is spent; the runner moved to `Error`.
    ///
    /// Sets: `job`, `attempt` (attempts in the failed streak), `reason`
    RetryExhausted,

    // === Control events ===
    /// A job was enabled.
    ///
    /// Sets: `job`, `reason` (unlock message)
    JobEnabled,

    /// A job was disabled.
    ///
    /// Sets: `job`
    JobDisabled,

    /// A balance threshold was crossed and its job unlocked.
    ///
    /// Sets: `job`, `amount`
    ThresholdUnlocked,

    /// The health monitor forced an unhealthy job into `Restarting`.
    ///
    /// Sets: `job`, `reason` (previous state)
    JobRestarting,

    /// A forced restart completed; the job is `Idle` again.
    ///
    /// Sets: `job`
    JobRestarted,

    // === Engine events ===
    /// Process memory is above the configured ceiling.
    ///
    /// Sets: `reason`, `amount` (current MB)
    MemoryPressure,

    /// Graceful stop requested (OS signal or explicit call).
    ShutdownRequested,

    /// All loops drained after a stop; every runner is `Paused`.
    AllStopped,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `job` (subscriber name), `reason`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `job` (subscriber name), `reason`
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the job, if applicable.
    pub job: Option<Arc<str>>,
    /// Human-readable reason (errors, messages, overflow details).
    pub reason: Option<Arc<str>>,
    /// Attempt or execution count.
    pub attempt: Option<u64>,
    /// Delay or duration in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Numeric payload (threshold amount, memory MB).
    pub amount: Option<f64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            job: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            amount: None,
        }
    }

    /// Attaches a job name.
    #[inline]
    pub fn with_job(mut self, job: impl Into<Arc<str>>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a numeric payload.
    #[inline]
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_job(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_job(subscriber)
            .with_reason(info)
    }
}
