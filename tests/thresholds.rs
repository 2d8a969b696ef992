use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobvisor::{
    Catalog, EngineConfig, JobError, JobFn, JobKind, Notify, NotifyError, ResourceProbe,
    StaticBalance, StatusReporter, Supervisor, SupervisorBuilder, ThresholdController,
};
use tokio_util::sync::CancellationToken;

struct QuietProbe;

impl ResourceProbe for QuietProbe {
    fn memory_mb(&self) -> f64 {
        64.0
    }
    fn cpu_percent(&self) -> f32 {
        2.0
    }
}

#[derive(Default)]
struct Inbox {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notify for Inbox {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

impl Inbox {
    async fn wait_for(&self, count: usize) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                let messages = self.messages.lock().unwrap().clone();
                if messages.len() >= count {
                    return messages;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("messages delivered")
    }
}

/// Sink whose delivery never completes.
struct StuckChat;

#[async_trait]
impl Notify for StuckChat {
    async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

fn standard_engine() -> Arc<Supervisor> {
    let mut builder = SupervisorBuilder::new(EngineConfig::default(), Catalog::default())
        .with_probe(Arc::new(QuietProbe));
    for kind in JobKind::ALL {
        builder = builder
            .register(kind.as_str(), JobFn::arc(|| async { Ok::<(), JobError>(()) }))
            .unwrap();
    }
    builder.build()
}

#[tokio::test]
async fn balance_growth_unlocks_the_standard_jobs_in_order() {
    let sup = standard_engine();
    let inbox = Arc::new(Inbox::default());
    let ctl = Arc::new(ThresholdController::new(sup.clone(), inbox.clone()));
    assert_eq!(sup.status_snapshot().active_jobs, 1);

    let mut unlocked = Vec::new();
    for balance in [100.0, 499.0, 500.0, 1000.0, 2000.0] {
        unlocked.extend(ctl.observe(balance).await.unwrap());
    }
    let jobs: Vec<_> = unlocked.iter().map(|u| u.job.as_str()).collect();
    assert_eq!(jobs, vec!["rwa_monitor", "trading_bot", "investment_engine"]);
    assert!(ctl.observe(500.0).await.unwrap().is_empty());

    let messages = inbox.wait_for(3).await;
    assert_eq!(
        messages,
        vec![
            JobKind::RwaMonitor.unlock_message().to_string(),
            JobKind::TradingBot.unlock_message().to_string(),
            JobKind::InvestmentEngine.unlock_message().to_string(),
        ]
    );

    let report = StatusReporter::new(sup.clone(), ctl).report().await;
    assert_eq!(report.total_jobs, 4);
    assert_eq!(report.active_jobs, 4);
    assert!(report.thresholds.iter().all(|t| t.unlocked));
    assert_eq!(report.jobs[0].name, "bounty_hunter");
    assert_eq!(report.process_memory_mb, 64.0);
    assert_eq!(report.error_rate_percent, 0.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["jobs"][1]["name"], "rwa_monitor");
    assert_eq!(json["jobs"][1]["status"], "idle");
    assert_eq!(json["thresholds"][2]["amount"], 2000.0);
}

#[tokio::test(start_paused = true)]
async fn stuck_notifier_does_not_block_reports_or_later_unlocks() {
    let sup = standard_engine();
    let ctl = Arc::new(ThresholdController::new(sup.clone(), Arc::new(StuckChat)));
    let reporter = StatusReporter::new(sup.clone(), ctl.clone());

    let first = tokio::time::timeout(Duration::from_secs(10), ctl.observe(600.0))
        .await
        .expect("observe returns while delivery hangs")
        .unwrap();
    assert_eq!(first.len(), 1);
    assert!(sup.job_status("rwa_monitor").unwrap().enabled);

    let report = tokio::time::timeout(Duration::from_secs(10), reporter.report())
        .await
        .expect("report returns while delivery hangs");
    assert!(report.thresholds[0].unlocked);
    assert!(!report.thresholds[1].unlocked);

    let second = tokio::time::timeout(Duration::from_secs(10), ctl.observe(1200.0))
        .await
        .expect("later pass runs while delivery hangs")
        .unwrap();
    assert_eq!(second[0].job, "trading_bot");
    assert!(sup.job_status("trading_bot").unwrap().enabled);
}

#[tokio::test(start_paused = true)]
async fn polling_loop_follows_the_provider() {
    let sup = standard_engine();
    let ctl = Arc::new(ThresholdController::new(sup.clone(), Arc::new(Inbox::default())));
    let balance = Arc::new(StaticBalance::new(600.0));
    let token = CancellationToken::new();

    let poller = {
        let ctl = ctl.clone();
        let balance = balance.clone();
        let token = token.clone();
        tokio::spawn(async move { ctl.run(balance, token).await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(sup.job_status("rwa_monitor").unwrap().enabled);
    assert!(!sup.job_status("trading_bot").unwrap().enabled);

    balance.set(1200.0);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(sup.job_status("trading_bot").unwrap().enabled);
    assert!(!sup.job_status("investment_engine").unwrap().enabled);

    token.cancel();
    poller.await.unwrap();
    assert_eq!(ctl.last_balance().await, Some(1200.0));
}

#[tokio::test]
async fn report_aggregates_errors() {
    let catalog = Catalog::default();
    let sup = SupervisorBuilder::new(EngineConfig::default(), catalog)
        .with_probe(Arc::new(QuietProbe))
        .register(
            "bounty_hunter",
            JobFn::arc(|| async { Err::<(), JobError>(JobError::fail("site down")) }),
        )
        .unwrap()
        .build();
    let ctl = Arc::new(ThresholdController::new(sup.clone(), Arc::new(Inbox::default())));

    let runner = sup.runner("bounty_hunter").unwrap();
    assert!(!runner.execute().await);

    let report = StatusReporter::new(sup, ctl).report().await;
    assert_eq!(report.total_jobs, 1);
    assert_eq!(report.total_executions, 1);
    assert_eq!(report.total_errors, 1);
    assert_eq!(report.error_rate_percent, 100.0);
    assert_eq!(
        report.jobs[0].last_error.as_deref(),
        Some("execution failed: site down")
    );
    assert_eq!(report.thresholds.len(), 3);
}
