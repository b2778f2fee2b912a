//! Resource sampling - periodic system counter snapshots

use tracing::trace;

use super::sample::{ResourceHistory, ResourceSample};

/// Raw counter access used by the sampler.
///
/// CPU and RAM follow "since last call" semantics, so the first reading after
/// construction may be a meaningless baseline. Network totals are raw
/// cumulative byte counters. `None` from any reader degrades that one field
/// to its default; it never aborts the sample.
pub trait CounterSource {
    fn cpu_percent(&mut self) -> Option<f32>;
    fn ram_percent(&mut self) -> Option<f32>;
    /// Usage percentage of the volume holding the working directory.
    fn disk_percent(&mut self) -> Option<f32>;
    /// Cumulative (sent, received) byte totals across all interfaces.
    fn net_totals(&mut self) -> Option<(u64, u64)>;
}

/// Samples system counters into a bounded rolling history.
///
/// Driven synchronously from the embedding UI's timer tick; owns its history
/// exclusively.
pub struct ResourceMonitor {
    source: Box<dyn CounterSource>,
    history: ResourceHistory,
    last_net: Option<(u64, u64)>,
}

impl ResourceMonitor {
    /// Sampler over the live system counters.
    pub fn new(capacity: usize) -> Self {
        Self::with_source(capacity, Box::new(sysinfo_source::SysinfoCounters::new()))
    }

    /// Sampler over a caller-provided counter source.
    pub fn with_source(capacity: usize, source: Box<dyn CounterSource>) -> Self {
        Self {
            source,
            history: ResourceHistory::new(capacity),
            last_net: None,
        }
    }

    /// Take one fresh reading and append it to the history, evicting the
    /// oldest entry once the capacity is reached. Partial success is the
    /// norm: each failed counter degrades to 0.0 while the rest populate.
    pub fn sample(&mut self) {
        let cpu_percent = self.source.cpu_percent().unwrap_or(0.0);
        let ram_percent = self.source.ram_percent().unwrap_or(0.0);
        let disk_percent = self.source.disk_percent().unwrap_or(0.0);

        let (net_sent_kb, net_recv_kb) = match self.source.net_totals() {
            Some((sent, recv)) => {
                // Delta against the previous cumulative totals; the first
                // reading has no baseline and reports zero.
                let (last_sent, last_recv) = self.last_net.unwrap_or((sent, recv));
                self.last_net = Some((sent, recv));
                (
                    sent.saturating_sub(last_sent) as f64 / 1024.0,
                    recv.saturating_sub(last_recv) as f64 / 1024.0,
                )
            }
            None => (0.0, 0.0),
        };

        let sample = ResourceSample {
            cpu_percent,
            ram_percent,
            disk_percent,
            net_sent_kb,
            net_recv_kb,
        };
        trace!(?sample, "sampled system counters");
        self.history.push(sample);
    }

    /// Most recent sample, or a zeroed default before the first `sample()`.
    pub fn snapshot(&self) -> ResourceSample {
        self.history.latest()
    }

    pub fn history(&self) -> &ResourceHistory {
        &self.history
    }
}

mod sysinfo_source {
    use std::path::PathBuf;

    use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, System};

    use super::CounterSource;

    /// Live counters backed by sysinfo.
    pub struct SysinfoCounters {
        system: System,
        networks: Networks,
        disks: Disks,
    }

    impl SysinfoCounters {
        pub fn new() -> Self {
            let mut system = System::new();
            // Prime the CPU counters so later reads have a baseline.
            system.refresh_cpu_specifics(CpuRefreshKind::everything());
            Self {
                system,
                networks: Networks::new_with_refreshed_list(),
                disks: Disks::new_with_refreshed_list(),
            }
        }
    }

    impl CounterSource for SysinfoCounters {
        fn cpu_percent(&mut self) -> Option<f32> {
            self.system.refresh_cpu_specifics(CpuRefreshKind::everything());
            Some(self.system.global_cpu_usage())
        }

        fn ram_percent(&mut self) -> Option<f32> {
            self.system
                .refresh_memory_specifics(MemoryRefreshKind::everything());
            let total = self.system.total_memory();
            if total == 0 {
                return None;
            }
            Some(self.system.used_memory() as f32 / total as f32 * 100.0)
        }

        fn disk_percent(&mut self) -> Option<f32> {
            self.disks.refresh();
            let cwd: PathBuf = std::env::current_dir().ok()?;
            // Deepest mount point containing the working directory.
            let disk = self
                .disks
                .iter()
                .filter(|d| cwd.starts_with(d.mount_point()))
                .max_by_key(|d| d.mount_point().as_os_str().len())?;
            let total = disk.total_space();
            if total == 0 {
                return None;
            }
            Some((total - disk.available_space()) as f32 / total as f32 * 100.0)
        }

        fn net_totals(&mut self) -> Option<(u64, u64)> {
            self.networks.refresh();
            let mut sent = 0u64;
            let mut recv = 0u64;
            for (_name, data) in self.networks.iter() {
                sent += data.total_transmitted();
                recv += data.total_received();
            }
            Some((sent, recv))
        }
    }
}
