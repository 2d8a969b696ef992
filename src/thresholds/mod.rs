//! Balance thresholds that unlock gated jobs.
//!
//! ## Contents
//! - [`ThresholdController`] compares balance updates with the catalog thresholds
//! - [`BalanceProvider`], [`StaticBalance`] where balances come from
//! - [`Notify`], [`LogNotifier`] where unlock messages go
//! - [`ThresholdStatus`], [`Unlock`] read-only results

mod balance;
mod controller;
mod notify;
mod threshold;

pub use balance::{BalanceProvider, StaticBalance};
pub use controller::ThresholdController;
pub use notify::{LogNotifier, Notify};
pub use threshold::{ThresholdStatus, Unlock};
