//! # Event subscribers.
//!
//! ```text
//! JobRunner / loops ── publish(Event) ──► Bus ──► subscriber listener
//!                                                      │
//!                                               SubscriberSet::emit
//!                                          ┌───────────┼───────────┐
//!                                          ▼           ▼           ▼
//!                                      LogWriter    Metrics      Custom
//! ```
//!
//! - [`Subscribe`]: trait implemented by event consumers
//! - [`SubscriberSet`]: per-subscriber queues, workers, panic isolation
//! - [`LogWriter`]: built-in subscriber logging through `tracing`

mod log;
mod subscriber;
mod subscriber_set;

pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
