//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: job loops, `JobRunner::execute`, the health monitor,
//!   `Supervisor::{enable, disable, stop}`, `ThresholdController`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver obtained via `Supervisor::bus()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
