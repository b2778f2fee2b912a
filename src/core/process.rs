//! Process directory - enumeration and graceful-then-forced termination

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::platform;

/// Grace window between asking a process to exit and force-killing it.
const KILL_GRACE: Duration = Duration::from_secs(3);

/// One running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// Why a kill did not complete. Access denial is kept distinct because
/// elevation would help there.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KillError {
    #[error("process does not exist")]
    NoSuchProcess,
    #[error("access denied - run as administrator")]
    AccessDenied,
}

/// Enumerates and terminates running processes.
pub struct ProcessDirectory {
    system: System,
}

impl ProcessDirectory {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn refresh(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );
    }

    /// All currently running processes, pid ascending. Processes that vanish
    /// or deny access mid-enumeration are skipped; the list is inherently
    /// racy.
    pub fn list(&mut self) -> Vec<ProcessEntry> {
        self.refresh();
        let mut entries: Vec<ProcessEntry> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .collect();
        entries.sort_unstable_by_key(|e| e.pid);
        entries
    }

    /// Ask `pid` to exit cooperatively, escalating to a forced kill once the
    /// grace window elapses.
    pub fn kill(&mut self, pid: u32) -> Result<(), KillError> {
        self.refresh();
        let target = Pid::from_u32(pid);
        let Some(process) = self.system.process(target) else {
            return Err(KillError::NoSuchProcess);
        };

        // Cooperative exit first; platforms without a termination signal
        // fall straight through to the hard kill.
        let asked = process
            .kill_with(Signal::Term)
            .unwrap_or_else(|| process.kill());
        debug!("requested termination of pid {} (delivered: {})", pid, asked);

        let deadline = Instant::now() + KILL_GRACE;
        while Instant::now() < deadline {
            thread::sleep(Duration::from_millis(100));
            self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[target]),
                true,
                ProcessRefreshKind::everything(),
            );
            if self.system.process(target).is_none() {
                return Ok(());
            }
        }

        let Some(process) = self.system.process(target) else {
            return Ok(());
        };
        if process.kill() {
            info!("force-killed pid {} after grace window", pid);
            Ok(())
        } else {
            Err(KillError::AccessDenied)
        }
    }

    /// Terminate every process whose image name matches `name`. A bulk
    /// terminate-by-image-name (children included) is tried first; if it
    /// reports failure, the live list is scanned for exact or suffix matches
    /// and each one goes through the graceful-then-forced escalation.
    /// Returns whether at least one process was affected.
    pub fn kill_by_name(&mut self, name: &str) -> bool {
        if platform::taskkill_image(name) {
            return true;
        }

        let matches: Vec<u32> = self
            .list()
            .into_iter()
            .filter(|e| image_name_matches(&e.name, name))
            .map(|e| e.pid)
            .collect();

        let mut any = false;
        for pid in matches {
            match self.kill(pid) {
                Ok(()) => any = true,
                Err(e) => warn!("could not kill pid {} matching '{}': {}", pid, name, e),
            }
        }
        any
    }
}

impl Default for ProcessDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive image-name comparison: exact, `.exe`-stripped, or
/// suffix match.
pub fn image_name_matches(image: &str, wanted: &str) -> bool {
    let image = image.to_ascii_lowercase();
    let wanted = wanted.to_ascii_lowercase();
    let stem = wanted.strip_suffix(".exe").unwrap_or(&wanted);
    image == wanted || image == stem || image.ends_with(&wanted)
}
