//! Optional per-phase resource logging for the report run.
//!
//! Only the current process is refreshed on each sample; a disabled monitor
//! never touches sysinfo.

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
pub struct ProcessSample {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub peak_rss_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_rss_mb: u64,
}

#[cfg(feature = "cli")]
impl Sampler {
    fn sample(&mut self) -> Option<(f32, u64)> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        let process = self.system.process(self.pid)?;
        let rss_mb = process.memory() / 1024 / 1024;
        self.peak_rss_mb = self.peak_rss_mb.max(rss_mb);
        Some((process.cpu_usage(), rss_mb))
    }
}

#[cfg(feature = "cli")]
pub struct ResourceMonitor {
    sampler: Option<Mutex<Sampler>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl ResourceMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = enabled
            .then(|| match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new(Sampler {
                    system: System::new(),
                    pid,
                    peak_rss_mb: 0,
                })),
                Err(e) => {
                    tracing::warn!("Resource monitoring unavailable: {}", e);
                    None
                }
            })
            .flatten();

        Self {
            sampler,
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn sample(&self) -> Option<ProcessSample> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let (cpu_percent, rss_mb) = sampler.sample()?;
        Some(ProcessSample {
            cpu_percent,
            rss_mb,
            peak_rss_mb: sampler.peak_rss_mb,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 {}: cpu {:.1}%, rss {} MB (peak {} MB) after {:?}",
                phase,
                s.cpu_percent,
                s.rss_mb,
                s.peak_rss_mb,
                s.elapsed
            );
        }
    }

    pub fn log_summary(&self) {
        if let Some(s) = self.sample() {
            tracing::info!("📊 Run took {:?}, peak rss {} MB", s.elapsed, s.peak_rss_mb);
        }
    }
}

#[cfg(not(feature = "cli"))]
pub struct ResourceMonitor;

#[cfg(not(feature = "cli"))]
impl ResourceMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_summary(&self) {}
}
