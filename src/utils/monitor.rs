use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
}

/// 每次執行建立一個，記錄各階段耗時與記憶體
pub struct RunMonitor {
    enabled: bool,
    started: Instant,
    last_mark: Instant,
    timings: Vec<StageTiming>,
    peak_memory_mb: u64,
    #[cfg(feature = "cli")]
    system: Option<(System, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            last_mark: now,
            timings: Vec::new(),
            peak_memory_mb: 0,
            #[cfg(feature = "cli")]
            system: if enabled {
                sysinfo::get_current_pid().ok().map(|pid| {
                    let mut system = System::new();
                    system.refresh_all();
                    (system, pid)
                })
            } else {
                None
            },
        }
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        let (system, pid) = self.system.as_mut()?;
        system.refresh_all();
        let memory_mb = system.process(*pid)?.memory() / 1024 / 1024;
        Some(memory_mb)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        None
    }

    /// Closes the current stage and logs how long it took.
    pub fn mark(&mut self, stage: &str) {
        if !self.enabled {
            return;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_mark);
        self.last_mark = now;

        let memory_mb = self.sample_memory_mb();
        if let Some(memory) = memory_mb {
            self.peak_memory_mb = self.peak_memory_mb.max(memory);
        }

        match memory_mb {
            Some(memory) => tracing::info!("📊 {} - {:?}, Memory: {}MB", stage, elapsed, memory),
            None => tracing::info!("📊 {} - {:?}", stage, elapsed),
        }

        self.timings.push(StageTiming {
            stage: stage.to_string(),
            elapsed,
            memory_mb,
        });
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Stages: {}, Peak Memory: {}MB",
            self.started.elapsed(),
            self.timings.len(),
            self.peak_memory_mb
        );
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
