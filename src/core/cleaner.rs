//! Temp cleaner - best-effort removal of temporary files

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a cleanup pass accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub bytes_freed: u64,
}

impl CleanupReport {
    fn merge(&mut self, other: CleanupReport) {
        self.files_removed += other.files_removed;
        self.bytes_freed += other.bytes_freed;
    }
}

/// Remove the contents of the usual temporary directories. Every removal is
/// individually best-effort: files that resist deletion (in use, or
/// privileged system paths without elevation) are skipped.
pub fn clear_temp() -> CleanupReport {
    let mut report = CleanupReport::default();
    for dir in temp_directories() {
        if dir.is_dir() {
            report.merge(clear_directory(&dir));
        }
    }
    info!(
        "temp cleanup removed {} files ({} bytes)",
        report.files_removed, report.bytes_freed
    );
    report
}

fn temp_directories() -> Vec<PathBuf> {
    let mut dirs = vec![std::env::temp_dir()];
    if cfg!(windows) {
        dirs.push(PathBuf::from(r"C:\Windows\Temp"));
        dirs.push(PathBuf::from(r"C:\Windows\Prefetch"));
    }
    dirs
}

/// Remove everything inside `dir`, leaving `dir` itself in place.
pub fn clear_directory(dir: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();
    let Ok(entries) = fs::read_dir(dir) else {
        return report;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            report.merge(clear_directory(&path));
            let _ = fs::remove_dir(&path);
        } else {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if fs::remove_file(&path).is_ok() {
                report.files_removed += 1;
                report.bytes_freed += size;
            } else {
                debug!("skipped undeletable file {}", path.display());
            }
        }
    }
    report
}
