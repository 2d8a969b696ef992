//! Job definitions.
//!
//! ## Contents
//! - [`JobSpec`], [`Priority`] static per-job settings
//! - [`Catalog`], [`ThresholdSpec`] the validated set the engine is built from
//! - [`JobBody`], [`JobFn`], [`BlockingFn`], [`JobRef`] the work itself
//! - [`JobState`], [`JobMetrics`] runtime state exposed in snapshots
//! - [`JobKind`] the standard jobs and their unlock messages

mod body;
mod catalog;
mod kind;
mod metrics;
mod spec;
mod state;

pub use body::{BlockingFn, JobBody, JobFn, JobRef};
pub use catalog::{Catalog, ThresholdSpec};
pub use kind::{JobKind, unlock_message};
pub use metrics::{EXECUTION_WINDOW, JobMetrics};
pub use spec::{JobSpec, Priority};
pub use state::JobState;

pub(crate) use state::StateCell;
