//! Error types used by the jobvisor engine and job bodies.
//!
//! - [`EngineError`]: failures of the engine's own bookkeeping (registration,
//!   catalog validation, loop machinery).
//! - [`JobError`]: failures of individual job invocations. These never leave
//!   the job's own loop; they become metrics, state transitions and events.
//! - [`BalanceError`], [`NotifyError`]: failures reported by external
//!   collaborators (balance provider, notification sink).
//!
//! Every enum provides `as_label` (stable snake_case, for logs/metrics).

use thiserror::Error;

/// # Errors produced by the engine itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A name was used that has no matching spec in the static catalog,
    /// or no registered runner.
    #[error("unknown job: {name}")]
    UnknownJob {
        /// The offending job name.
        name: String,
    },

    /// The static catalog is inconsistent (duplicate names, dangling threshold, ...).
    #[error("invalid catalog: {reason}")]
    InvalidCatalog {
        /// What is wrong with it.
        reason: String,
    },

    /// `start()` was called while the engine was already running.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// The per-job loop machinery failed unexpectedly. All loops were cancelled.
    #[error("supervisor fatal error: {reason}")]
    Fatal {
        /// Description of the failure (usually a panicked loop).
        reason: String,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::EngineError;
    ///
    /// let err = EngineError::UnknownJob { name: "ghost".into() };
    /// assert_eq!(err.as_label(), "engine_unknown_job");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::UnknownJob { .. } => "engine_unknown_job",
            EngineError::InvalidCatalog { .. } => "engine_invalid_catalog",
            EngineError::AlreadyStarted => "engine_already_started",
            EngineError::Fatal { .. } => "engine_fatal",
        }
    }

    /// Returns a human-readable message (for logs/UI).
    pub fn as_message(&self) -> String {
        match self {
            EngineError::UnknownJob { name } => format!("no job named '{name}' in the catalog"),
            EngineError::InvalidCatalog { reason } => format!("catalog rejected: {reason}"),
            EngineError::AlreadyStarted => "engine is already running".to_string(),
            EngineError::Fatal { reason } => format!("fatal: {reason}"),
        }
    }

    /// Returns true if this error terminates the whole engine.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Fatal { .. })
    }
}

/// # Errors produced by job invocations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The job body returned an error.
    #[error("execution failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The job body panicked; the panic was caught at the loop boundary.
    #[error("job panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// The bounded retry policy gave up. Flips the runner to `Error`.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Attempts made in the failed streak (initial + retries).
        attempts: u32,
        /// Message of the last failure.
        last: String,
    },
}

impl JobError {
    /// Convenience constructor for [`JobError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        JobError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    ///
    /// assert_eq!(JobError::fail("boom").as_label(), "job_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Fail { .. } => "job_failed",
            JobError::Panicked { .. } => "job_panicked",
            JobError::RetryExhausted { .. } => "job_retry_exhausted",
        }
    }

    /// Returns a human-readable message (for logs/UI).
    pub fn as_message(&self) -> String {
        match self {
            JobError::Fail { reason } => format!("error: {reason}"),
            JobError::Panicked { info } => format!("panic: {info}"),
            JobError::RetryExhausted { attempts, last } => {
                format!("gave up after {attempts} attempts ({last})")
            }
        }
    }
}

/// Error returned by a [`BalanceProvider`](crate::BalanceProvider).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    /// The provider could not produce a value right now.
    #[error("balance unavailable: {reason}")]
    Unavailable {
        /// Why.
        reason: String,
    },

    /// The provider produced NaN or an infinite value.
    #[error("balance is not a finite number: {value}")]
    NotFinite {
        /// The rejected value.
        value: f64,
    },
}

/// Error returned by a [`Notify`](crate::Notify) sink. Logged, never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("notification not delivered: {reason}")]
pub struct NotifyError {
    /// Why delivery failed.
    pub reason: String,
}

impl NotifyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
