//! Runtime core: job runners, loops, health monitoring and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (built by
//! [`SupervisorBuilder`]), [`JobRunner`], the snapshot types and the
//! [`ResourceProbe`] seam.
//!
//! Internal modules:
//! - [`runner`]: one job's state, metrics and single invocation;
//! - [`job_loop`]: drives one runner forever with bounded retry;
//! - [`health`]: periodic stall detection, forced restart, memory watch;
//! - [`supervisor`]: spawns loops, handles stop/drain, control and status;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`resources`]: process memory/CPU sampling.

use std::any::Any;

mod builder;
mod health;
mod job_loop;
mod resources;
mod runner;
mod shutdown;
mod snapshot;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use resources::{ResourceProbe, SysinfoProbe};
pub use runner::JobRunner;
pub use snapshot::{JobSnapshot, SupervisorSnapshot};
pub use supervisor::{RunState, Supervisor};

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
