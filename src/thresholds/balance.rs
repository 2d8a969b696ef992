//! # Balance source.
//!
//! [`BalanceProvider`] is the seam to whatever system knows the current
//! balance (wallet, exchange account, ledger). The controller polls it; a
//! failed read skips that cycle.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::BalanceError;

/// Source of the current balance.
#[async_trait]
pub trait BalanceProvider: Send + Sync + 'static {
    async fn current_balance(&self) -> Result<f64, BalanceError>;
}

/// Provider holding a value set by the caller.
///
/// Useful when the balance is pushed from elsewhere but the polling loop is
/// still wanted, and in tests.
#[derive(Debug, Default)]
pub struct StaticBalance {
    value: Mutex<Option<f64>>,
}

impl StaticBalance {
    pub fn new(value: f64) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }

    /// Replaces the value returned by the next read.
    pub fn set(&self, value: f64) {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
    }
}

#[async_trait]
impl BalanceProvider for StaticBalance {
    async fn current_balance(&self) -> Result<f64, BalanceError> {
        let value = *self.value.lock().unwrap_or_else(|e| e.into_inner());
        value.ok_or_else(|| BalanceError::Unavailable {
            reason: "no balance set".into(),
        })
    }
}
