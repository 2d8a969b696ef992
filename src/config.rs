//! # Engine configuration.
//!
//! [`EngineConfig`] centralizes the timing knobs of the supervisor runtime.
//! Per-job settings (interval, budgets, retry policy) live on
//! [`JobSpec`](crate::JobSpec) instead.
//!
//! ## Sentinel values
//! - `memory_ceiling_mb = 0` → no process-wide memory watch
//! - `metrics_log_every = 0` → no periodic metrics summary
//! - `balance_epsilon <= 0` → no debounce (every update triggers a pass)

use std::time::Duration;

/// Global configuration for the engine.
///
/// ## Field semantics
/// - `loop_pause`: fixed pause between two iterations of a job loop
/// - `health_interval`: period of the health monitor pass
/// - `stall_timeout`: how long a job may stay `Running` before it counts as stalled
/// - `restart_grace`: how long a forced restart stays in `Restarting`
/// - `memory_ceiling_mb`: process RSS ceiling that triggers a reclaim hint
/// - `metrics_log_every`: health cycles between two metrics summaries
/// - `balance_epsilon`: minimum balance change that triggers a threshold pass
/// - `balance_poll_interval`: period of the balance polling loop
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Pause between job loop iterations.
    ///
    /// Bounds the busy-poll rate of every job regardless of its `min_interval`.
    pub loop_pause: Duration,

    /// Period of the health monitor.
    pub health_interval: Duration,

    /// A job `Running` for longer than this is considered stalled.
    pub stall_timeout: Duration,

    /// Time spent in `Restarting` before a stalled job is set back to `Idle`.
    pub restart_grace: Duration,

    /// Process memory ceiling in MB (`0` = disabled).
    pub memory_ceiling_mb: u64,

    /// Emit a metrics summary every N health cycles (`0` = never).
    pub metrics_log_every: u32,

    /// Balance updates closer than this to the previous one are ignored.
    pub balance_epsilon: f64,

    /// Period of [`ThresholdController::run`](crate::ThresholdController::run).
    pub balance_poll_interval: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl EngineConfig {
    /// Returns the memory ceiling as an `Option` (`None` = disabled).
    #[inline]
    pub fn memory_ceiling(&self) -> Option<u64> {
        if self.memory_ceiling_mb == 0 {
            None
        } else {
            Some(self.memory_ceiling_mb)
        }
    }

    /// Returns true when the metrics summary is due on health cycle `cycle` (1-based).
    #[inline]
    pub fn metrics_due(&self, cycle: u64) -> bool {
        self.metrics_log_every != 0 && cycle % u64::from(self.metrics_log_every) == 0
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `loop_pause = 1s`
    /// - `health_interval = 30s`
    /// - `stall_timeout = 5min`
    /// - `restart_grace = 5s`
    /// - `memory_ceiling_mb = 300`
    /// - `metrics_log_every = 20` (every ten minutes with the default interval)
    /// - `balance_epsilon = 0.01`
    /// - `balance_poll_interval = 10s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            loop_pause: Duration::from_secs(1),
            health_interval: Duration::from_secs(30),
            stall_timeout: Duration::from_secs(5 * 60),
            restart_grace: Duration::from_secs(5),
            memory_ceiling_mb: 300,
            metrics_log_every: 20,
            balance_epsilon: 0.01,
            balance_poll_interval: Duration::from_secs(10),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_disable_features() {
        let cfg = EngineConfig {
            memory_ceiling_mb: 0,
            metrics_log_every: 0,
            bus_capacity: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.memory_ceiling(), None);
        assert!(!cfg.metrics_due(20));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn metrics_due_every_n_cycles() {
        let cfg = EngineConfig::default();
        assert!(!cfg.metrics_due(1));
        assert!(cfg.metrics_due(20));
        assert!(cfg.metrics_due(40));
        assert!(!cfg.metrics_due(41));
    }
}
