//! # ThresholdController: unlocks jobs as the balance grows.
//!
//! ```text
//! observe(balance)                       (push, or via poll_once/run)
//!   ├─ |balance - last| < epsilon → skip (debounce)
//!   └─ for each locked threshold, ascending amount:
//!        balance >= amount → Supervisor::enable(job)
//!                              ├─ Ok(msg) → unlocked = true, publish ThresholdUnlocked
//!                              └─ Err     → logged, threshold stays locked
//!   lock released → messages queued ──► [outbox] ──► worker ──► notifier.notify()
//! ```
//!
//! ## Rules
//! - A threshold unlocks at most once; a lower balance never re-locks it.
//! - Passes are serialized: concurrent `observe` calls never double-enable.
//! - The first observation always runs a pass.
//! - Delivery never holds the pass lock: a slow notifier delays only later messages.
//! - Notifier failures are logged and never undo the enable. A full outbox drops the message.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::core::Supervisor;
use crate::error::BalanceError;
use crate::events::{Event, EventKind};
use crate::thresholds::balance::BalanceProvider;
use crate::thresholds::notify::Notify;
use crate::thresholds::threshold::{Threshold, ThresholdStatus, Unlock};

/// Unlock messages waiting for the notifier.
const OUTBOX_CAPACITY: usize = 64;

struct ControllerState {
    thresholds: Vec<Threshold>,
    last_balance: Option<f64>,
}

/// Compares balance updates against the catalog thresholds.
pub struct ThresholdController {
    supervisor: Arc<Supervisor>,
    outbox: mpsc::Sender<String>,
    epsilon: f64,
    state: Mutex<ControllerState>,
}

impl ThresholdController {
    /// Creates a controller for the supervisor's catalog thresholds and spawns
    /// the notification worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(supervisor: Arc<Supervisor>, notifier: Arc<dyn Notify>) -> Self {
        let mut thresholds: Vec<Threshold> = supervisor
            .catalog()
            .thresholds()
            .iter()
            .map(Threshold::from_spec)
            .collect();
        thresholds.sort_by(|a, b| a.amount.total_cmp(&b.amount));
        let epsilon = supervisor.config().balance_epsilon;

        let (outbox, mut rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = notifier.notify(&message).await {
                    tracing::warn!(target: "jobvisor", %message, error = %e, "unlock notification failed");
                }
            }
        });

        Self {
            supervisor,
            outbox,
            epsilon,
            state: Mutex::new(ControllerState {
                thresholds,
                last_balance: None,
            }),
        }
    }

    /// Applies one balance update. Returns the jobs unlocked by it, in ascending order.
    pub async fn observe(&self, balance: f64) -> Result<Vec<Unlock>, BalanceError> {
        if !balance.is_finite() {
            return Err(BalanceError::NotFinite { value: balance });
        }

        let unlocked = self.pass(balance).await;
        for u in &unlocked {
            if let Err(e) = self.outbox.try_send(u.message.clone()) {
                tracing::warn!(target: "jobvisor", job = %u.job, error = %e, "unlock notification dropped");
            }
        }
        Ok(unlocked)
    }

    /// Runs one comparison pass under the state lock.
    async fn pass(&self, balance: f64) -> Vec<Unlock> {
        let mut state = self.state.lock().await;
        if let Some(last) = state.last_balance {
            if (balance - last).abs() < self.epsilon {
                tracing::trace!(target: "jobvisor", balance, last, "balance change below epsilon, skipped");
                return Vec::new();
            }
        }
        state.last_balance = Some(balance);

        let mut unlocked = Vec::new();
        for threshold in state.thresholds.iter_mut() {
            if !threshold.is_crossed_by(balance) {
                continue;
            }
            let message = match self.supervisor.enable(&threshold.job) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(target: "jobvisor", job = %threshold.job, amount = threshold.amount, error = %e, "threshold crossed but job not enabled");
                    continue;
                }
            };
            threshold.unlocked = true;
            self.supervisor.bus().publish(
                Event::new(EventKind::ThresholdUnlocked)
                    .with_job(threshold.job.as_str())
                    .with_amount(threshold.amount),
            );
            unlocked.push(Unlock {
                amount: threshold.amount,
                job: threshold.job.clone(),
                message,
            });
        }
        unlocked
    }

    /// Reads the provider once and applies the value.
    pub async fn poll_once(&self, provider: &dyn BalanceProvider) -> Result<Vec<Unlock>, BalanceError> {
        let balance = provider.current_balance().await?;
        self.observe(balance).await
    }

    /// Polls `provider` every `balance_poll_interval` until `token` is cancelled.
    ///
    /// Provider errors are logged and that cycle is skipped.
    pub async fn run(&self, provider: Arc<dyn BalanceProvider>, token: CancellationToken) {
        let period = self.supervisor.config().balance_poll_interval;
        loop {
            if let Err(e) = self.poll_once(provider.as_ref()).await {
                tracing::warn!(target: "jobvisor", error = %e, "balance poll failed");
            }
            tokio::select! {
                _ = tokio::time::sleep(period) => {}
                _ = token.cancelled() => break,
            }
        }
        tracing::debug!(target: "jobvisor", "balance polling stopped");
    }

    /// Current state of every threshold, ascending by amount.
    pub async fn thresholds(&self) -> Vec<ThresholdStatus> {
        self.state
            .lock()
            .await
            .thresholds
            .iter()
            .map(Threshold::status)
            .collect()
    }

    /// Last balance that ran a pass.
    pub async fn last_balance(&self) -> Option<f64> {
        self.state.lock().await.last_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::SupervisorBuilder;
    use crate::error::{JobError, NotifyError};
    use crate::jobs::{Catalog, JobFn, JobSpec, Priority, ThresholdSpec};
    use crate::thresholds::StaticBalance;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Recorder {
        sent: StdMutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notify for Recorder {
        async fn notify(&self, message: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.to_string());
            if self.fail {
                Err(NotifyError::new("chat offline"))
            } else {
                Ok(())
            }
        }
    }

    async fn delivered(recorder: &Recorder, count: usize) -> Vec<String> {
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            loop {
                let sent = recorder.sent.lock().unwrap().clone();
                if sent.len() >= count {
                    return sent;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("notifications delivered")
    }

    fn supervisor(register: &[&str]) -> Arc<Supervisor> {
        let catalog = Catalog::new(
            vec![
                JobSpec::new("a", Priority::High).gated(),
                JobSpec::new("b", Priority::Medium).gated(),
                JobSpec::new("c", Priority::Low).gated(),
            ],
            vec![
                ThresholdSpec::new(2000.0, "c"),
                ThresholdSpec::new(500.0, "a"),
                ThresholdSpec::new(1000.0, "b"),
            ],
        )
        .unwrap();
        let mut builder = SupervisorBuilder::new(EngineConfig::default(), catalog);
        for name in register {
            builder = builder
                .register(name, JobFn::arc(|| async { Ok::<(), JobError>(()) }))
                .unwrap();
        }
        builder.build()
    }

    #[tokio::test]
    async fn unlocks_once_each_in_ascending_order() {
        let sup = supervisor(&["a", "b", "c"]);
        let recorder = Arc::new(Recorder::default());
        let ctl = ThresholdController::new(sup.clone(), recorder.clone());

        let mut order = Vec::new();
        for balance in [100.0, 499.0, 500.0, 1000.0, 2000.0] {
            for u in ctl.observe(balance).await.unwrap() {
                order.push(u.job);
            }
        }
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(ctl.observe(500.0).await.unwrap().is_empty());
        let sent = delivered(&recorder, 3).await;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], crate::jobs::unlock_message("a"));
        assert_eq!(sup.status_snapshot().active_jobs, 3);
    }

    #[tokio::test]
    async fn one_jump_unlocks_every_lower_threshold() {
        let sup = supervisor(&["a", "b", "c"]);
        let ctl = ThresholdController::new(sup, Arc::new(Recorder::default()));
        let jobs: Vec<_> = ctl
            .observe(1500.0)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.job)
            .collect();
        assert_eq!(jobs, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn small_changes_are_debounced() {
        let sup = supervisor(&["a"]);
        let ctl = ThresholdController::new(sup, Arc::new(Recorder::default()));
        assert!(ctl.observe(499.995).await.unwrap().is_empty());
        assert!(ctl.observe(500.0).await.unwrap().is_empty());
        assert_eq!(ctl.last_balance().await, Some(499.995));
        assert_eq!(ctl.observe(500.01).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enable_failure_keeps_threshold_locked() {
        let sup = supervisor(&["b"]);
        let ctl = ThresholdController::new(sup, Arc::new(Recorder::default()));
        let unlocked = ctl.observe(1000.0).await.unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].job, "b");

        let statuses = ctl.thresholds().await;
        assert!(!statuses[0].unlocked);
        assert!(statuses[1].unlocked);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_undo_enable() {
        let sup = supervisor(&["a"]);
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let ctl = ThresholdController::new(sup.clone(), recorder.clone());
        assert_eq!(ctl.observe(600.0).await.unwrap().len(), 1);
        delivered(&recorder, 1).await;
        assert!(sup.job_status("a").unwrap().enabled);
        assert!(ctl.thresholds().await[0].unlocked);
    }

    #[tokio::test]
    async fn rejects_non_finite_balance_and_provider_errors() {
        let sup = supervisor(&["a"]);
        let ctl = ThresholdController::new(sup, Arc::new(Recorder::default()));
        assert!(matches!(
            ctl.observe(f64::NAN).await,
            Err(BalanceError::NotFinite { .. })
        ));
        assert!(ctl.poll_once(&StaticBalance::default()).await.is_err());
        assert_eq!(
            ctl.poll_once(&StaticBalance::new(700.0)).await.unwrap()[0].job,
            "a"
        );
    }
}
