use serde::Serialize;

use crate::jobs::ThresholdSpec;

/// Runtime state of one balance threshold.
///
/// `unlocked` goes from `false` to `true` at most once and never reverts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Threshold {
    pub(crate) amount: f64,
    pub(crate) job: String,
    pub(crate) unlocked: bool,
}

impl Threshold {
    pub(crate) fn from_spec(spec: &ThresholdSpec) -> Self {
        Self {
            amount: spec.amount,
            job: spec.job.clone(),
            unlocked: false,
        }
    }

    pub(crate) fn is_crossed_by(&self, balance: f64) -> bool {
        !self.unlocked && balance >= self.amount
    }

    pub(crate) fn status(&self) -> ThresholdStatus {
        ThresholdStatus {
            amount: self.amount,
            job: self.job.clone(),
            unlocked: self.unlocked,
        }
    }
}

/// Read-only view of a threshold for reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThresholdStatus {
    pub amount: f64,
    pub job: String,
    pub unlocked: bool,
}

/// One job unlocked by a balance update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Unlock {
    pub amount: f64,
    pub job: String,
    /// Message returned by the enable call and sent to the notifier.
    pub message: String,
}
