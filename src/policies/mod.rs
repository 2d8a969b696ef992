//! Retry policies.
//!
//! ## Contents
//! - [`RetryPolicy`] how many retries a failed invocation gets
//! - [`BackoffPolicy`] how long to wait between them (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization of that wait
//!
//! ## Defaults
//! - `RetryPolicy::default()` → 3 retries, constant 5s delay.
//! - `JitterPolicy::None`.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{RetryDecision, RetryPolicy};
