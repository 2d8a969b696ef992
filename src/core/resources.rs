//! # Process resource sampling.
//!
//! [`ResourceProbe`] is the seam through which the runner and the health
//! monitor read process memory and CPU. [`SysinfoProbe`] reads the current
//! process through `sysinfo`; tests plug in fixed values.

use std::sync::Mutex;

use sysinfo::{ProcessesToUpdate, System};

/// Source of process resource readings.
pub trait ResourceProbe: Send + Sync + 'static {
    /// Resident memory of the process, in MB.
    fn memory_mb(&self) -> f64;

    /// CPU usage of the process, in percent of one core.
    fn cpu_percent(&self) -> f32;
}

/// Probe backed by `sysinfo`, refreshing only the current process.
pub struct SysinfoProbe {
    sys: Mutex<System>,
    pid: Option<sysinfo::Pid>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(target: "jobvisor", error = %e, "cannot resolve current pid, resource readings disabled");
                None
            }
        };
        Self {
            sys: Mutex::new(System::new()),
            pid,
        }
    }

    fn sample<T: Default>(&self, read: impl FnOnce(&sysinfo::Process) -> T) -> T {
        let Some(pid) = self.pid else {
            return T::default();
        };
        let mut sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        sys.process(pid).map(read).unwrap_or_default()
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn memory_mb(&self) -> f64 {
        self.sample(|p| p.memory() as f64 / 1024.0 / 1024.0)
    }

    fn cpu_percent(&self) -> f32 {
        self.sample(|p| p.cpu_usage())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_current_process() {
        let probe = SysinfoProbe::new();
        assert!(probe.memory_mb() > 0.0);
        assert!(probe.cpu_percent() >= 0.0);
    }
}
