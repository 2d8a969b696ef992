//! # Example: Full engine with threshold unlocks
//!
//! Runs the standard catalog with simulated job bodies. A fake balance grows
//! on every poll, unlocking `rwa_monitor`, `trading_bot` and
//! `investment_engine` in turn. A JSON status report is printed every 30s.
//!
//! ```text
//! RUST_LOG=jobvisor=debug cargo run --example engine
//! ```
//! Stop with Ctrl-C.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use jobvisor::{
    BalanceError, BalanceProvider, BlockingFn, Catalog, EngineConfig, JobError, JobFn, JobKind,
    JobRef, LogNotifier, LogWriter, StatusReporter, SupervisorBuilder, ThresholdController,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Balance that grows by `step` on every read.
struct GrowingBalance {
    value: Mutex<f64>,
    step: f64,
}

#[async_trait]
impl BalanceProvider for GrowingBalance {
    async fn current_balance(&self) -> Result<f64, BalanceError> {
        let mut v = self.value.lock().unwrap();
        *v += self.step;
        Ok(*v)
    }
}

/// Async body that takes `work_ms` and fails with probability `fail_rate`.
fn simulated(name: &'static str, work_ms: u64, fail_rate: f64) -> JobRef {
    JobFn::arc(move || async move {
        tokio::time::sleep(Duration::from_millis(work_ms)).await;
        if rand::random_bool(fail_rate) {
            return Err(JobError::fail(format!("{name}: upstream unavailable")));
        }
        tracing::info!(job = name, "work done");
        Ok(())
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = EngineConfig {
        balance_poll_interval: Duration::from_secs(5),
        ..EngineConfig::default()
    };

    let investment: JobRef = BlockingFn::arc(|| {
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    });

    let sup = SupervisorBuilder::new(cfg, Catalog::default())
        .with_subscribers(vec![Arc::new(LogWriter::new())])
        .register(JobKind::BountyHunter.as_str(), simulated("bounty_hunter", 500, 0.1))?
        .register(JobKind::RwaMonitor.as_str(), simulated("rwa_monitor", 200, 0.05))?
        .register(JobKind::TradingBot.as_str(), simulated("trading_bot", 100, 0.3))?
        .register(JobKind::InvestmentEngine.as_str(), investment)?
        .build();

    let thresholds = Arc::new(ThresholdController::new(
        sup.clone(),
        Arc::new(LogNotifier::new()),
    ));
    let balance = Arc::new(GrowingBalance {
        value: Mutex::new(0.0),
        step: 150.0,
    });
    let token = CancellationToken::new();

    let poller = {
        let thresholds = thresholds.clone();
        let token = token.clone();
        tokio::spawn(async move { thresholds.run(balance, token).await })
    };

    let reporter = {
        let reporter = StatusReporter::new(sup.clone(), thresholds.clone());
        let token = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(30)) => {}
                    _ = token.cancelled() => break,
                }
                let report = reporter.report().await;
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{json}"),
                    Err(e) => tracing::warn!(error = %e, "cannot render report"),
                }
            }
        })
    };

    sup.run_until_signal().await?;
    token.cancel();
    poller.await?;
    reporter.await?;
    Ok(())
}
