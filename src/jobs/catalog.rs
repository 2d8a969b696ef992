//! # Static job catalog.
//!
//! The [`Catalog`] is the fixed set of job specs and balance thresholds the
//! engine is built from. It is validated once on construction:
//!
//! - job names are unique and non-empty
//! - every threshold names a job of the catalog, at most one threshold per job
//! - threshold amounts are finite and non-negative
//!
//! [`Catalog::default`] returns the standard four-job catalog.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::EngineError;
use crate::jobs::{JobKind, JobSpec, Priority};
use crate::policies::RetryPolicy;

/// A balance level that unlocks one job.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdSpec {
    /// Balance at or above which the job is enabled.
    pub amount: f64,
    /// Job to enable.
    pub job: String,
}

impl ThresholdSpec {
    pub fn new(amount: f64, job: impl Into<String>) -> Self {
        Self {
            amount,
            job: job.into(),
        }
    }
}

/// Validated set of job specs and thresholds.
#[derive(Clone, Debug)]
pub struct Catalog {
    jobs: Vec<JobSpec>,
    thresholds: Vec<ThresholdSpec>,
}

impl Catalog {
    /// Validates and builds a catalog.
    pub fn new(jobs: Vec<JobSpec>, thresholds: Vec<ThresholdSpec>) -> Result<Self, EngineError> {
        let mut names = HashSet::with_capacity(jobs.len());
        for spec in &jobs {
            if spec.name().is_empty() {
                return Err(invalid("empty job name"));
            }
            if !names.insert(spec.name()) {
                return Err(invalid(format!("duplicate job '{}'", spec.name())));
            }
        }

        let mut gated = HashSet::with_capacity(thresholds.len());
        for t in &thresholds {
            if !t.amount.is_finite() || t.amount < 0.0 {
                return Err(invalid(format!(
                    "threshold for '{}' has invalid amount {}",
                    t.job, t.amount
                )));
            }
            if !names.contains(t.job.as_str()) {
                return Err(invalid(format!("threshold names unknown job '{}'", t.job)));
            }
            if !gated.insert(t.job.as_str()) {
                return Err(invalid(format!("job '{}' has more than one threshold", t.job)));
            }
        }

        Ok(Self { jobs, thresholds })
    }

    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    pub fn thresholds(&self) -> &[ThresholdSpec] {
        &self.thresholds
    }

    /// Looks up a job spec by name.
    pub fn get(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.iter().find(|s| s.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for Catalog {
    /// Standard catalog:
    ///
    /// | job                 | priority | interval | memory | cpu | at start | threshold |
    /// |---------------------|----------|----------|--------|-----|----------|-----------|
    /// | `bounty_hunter`     | critical | 5min     | 50MB   | 10% | enabled  |           |
    /// | `rwa_monitor`       | high     | 1min     | 30MB   | 5%  | disabled | 500       |
    /// | `trading_bot`       | medium   | 10s      | 40MB   | 15% | disabled | 1000      |
    /// | `investment_engine` | low      | 1h       | 25MB   | 3%  | disabled | 2000      |
    ///
    /// Every job retries 3 times with 5s between attempts.
    fn default() -> Self {
        let retry = RetryPolicy::new(3, Duration::from_secs(5));
        let jobs = vec![
            JobSpec::new(JobKind::BountyHunter.as_str(), Priority::Critical)
                .with_min_interval(Duration::from_secs(300))
                .with_budgets(50, 10.0)
                .with_retry(retry),
            JobSpec::new(JobKind::RwaMonitor.as_str(), Priority::High)
                .with_min_interval(Duration::from_secs(60))
                .with_budgets(30, 5.0)
                .with_retry(retry)
                .gated(),
            JobSpec::new(JobKind::TradingBot.as_str(), Priority::Medium)
                .with_min_interval(Duration::from_secs(10))
                .with_budgets(40, 15.0)
                .with_retry(retry)
                .gated(),
            JobSpec::new(JobKind::InvestmentEngine.as_str(), Priority::Low)
                .with_min_interval(Duration::from_secs(3600))
                .with_budgets(25, 3.0)
                .with_retry(retry)
                .gated(),
        ];
        let thresholds = vec![
            ThresholdSpec::new(500.0, JobKind::RwaMonitor.as_str()),
            ThresholdSpec::new(1000.0, JobKind::TradingBot.as_str()),
            ThresholdSpec::new(2000.0, JobKind::InvestmentEngine.as_str()),
        ];
        Self { jobs, thresholds }
    }
}

fn invalid(reason: impl Into<String>) -> EngineError {
    EngineError::InvalidCatalog {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let def = Catalog::default();
        let rebuilt = Catalog::new(def.jobs().to_vec(), def.thresholds().to_vec());
        assert!(rebuilt.is_ok());
        assert_eq!(def.jobs().len(), 4);
        assert!(def.get("bounty_hunter").unwrap().enabled_at_start());
        assert!(!def.get("trading_bot").unwrap().enabled_at_start());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Catalog::new(
            vec![
                JobSpec::new("a", Priority::Low),
                JobSpec::new("a", Priority::High),
            ],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err.as_label(), "engine_invalid_catalog");
    }

    #[test]
    fn rejects_dangling_and_non_finite_thresholds() {
        let jobs = vec![JobSpec::new("a", Priority::Low)];
        assert!(Catalog::new(jobs.clone(), vec![ThresholdSpec::new(10.0, "b")]).is_err());
        assert!(Catalog::new(jobs.clone(), vec![ThresholdSpec::new(f64::NAN, "a")]).is_err());
        assert!(
            Catalog::new(
                jobs,
                vec![ThresholdSpec::new(1.0, "a"), ThresholdSpec::new(2.0, "a")]
            )
            .is_err()
        );
    }
}
