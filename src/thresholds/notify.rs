//! # Notification sink.
//!
//! [`Notify`] delivers unlock messages to a human (chat, mail, pager).
//! Delivery is best effort: a failure is logged by the caller and never
//! undoes the enable that produced the message.

use async_trait::async_trait;

use crate::error::NotifyError;

/// Best-effort message sink.
#[async_trait]
pub trait Notify: Send + Sync + 'static {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

/// Notifier that writes messages to the `tracing` log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notify for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        tracing::info!(target: "jobvisor", %message, "notification");
        Ok(())
    }
}
