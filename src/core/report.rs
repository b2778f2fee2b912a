//! One-shot system summary for display

use serde::{Deserialize, Serialize};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, System};

/// Static facts about the machine, captured once on request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub hostname: String,
    pub architecture: String,
    pub logical_cpus: usize,
    pub physical_cpus: usize,
    pub total_ram_gb: f64,
}

impl SystemReport {
    /// Capture the current system facts; unavailable fields degrade to
    /// defaults.
    pub fn capture() -> Self {
        let mut system = System::new();
        system.refresh_cpu_specifics(CpuRefreshKind::everything());
        system.refresh_memory_specifics(MemoryRefreshKind::everything());

        let total_ram_gb = system.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
        Self {
            os_name: System::name().unwrap_or_default(),
            os_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
            hostname: System::host_name().unwrap_or_default(),
            architecture: std::env::consts::ARCH.to_string(),
            logical_cpus: system.cpus().len(),
            physical_cpus: system.physical_core_count().unwrap_or(0),
            total_ram_gb: (total_ram_gb * 100.0).round() / 100.0,
        }
    }

    /// Pretty JSON rendering, for export or copy-to-clipboard use.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
