//! Installed application directory - Uninstall registry trees and app actions

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::process::ProcessDirectory;
use crate::platform;

/// One installed application, as advertised by an Uninstall registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    pub name: String,
    pub version: String,
    /// Best-guess launchable path: an existing DisplayIcon executable, else
    /// an existing InstallLocation directory, else empty.
    pub path: String,
    /// Quiet uninstall command when advertised, interactive otherwise.
    pub uninstall_command: String,
}

/// Raw values of one Uninstall subkey, before interpretation.
#[derive(Debug, Clone, Default)]
pub struct UninstallEntry {
    pub display_name: Option<String>,
    pub display_version: Option<String>,
    pub display_icon: Option<String>,
    pub install_location: Option<String>,
    pub uninstall_string: Option<String>,
    pub quiet_uninstall_string: Option<String>,
}

impl UninstallEntry {
    /// Quiet command preferred over the interactive one; `None` when the
    /// entry advertises neither.
    pub fn uninstall_command(&self) -> Option<String> {
        self.quiet_uninstall_string
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.uninstall_string
                    .clone()
                    .filter(|s| !s.trim().is_empty())
            })
    }
}

/// Interpret a raw entry. Entries without a display name are dropped.
pub fn resolve_entry(entry: &UninstallEntry) -> Option<InstalledApp> {
    let name = entry.display_name.as_deref()?.trim();
    if name.is_empty() {
        return None;
    }

    let mut path = String::new();
    if let Some(icon) = entry.display_icon.as_deref() {
        // DisplayIcon is often `path,index`; strip the index and quotes.
        let candidate = icon.split(',').next().unwrap_or("").trim().trim_matches('"');
        if !candidate.is_empty() && Path::new(candidate).is_file() {
            path = candidate.to_string();
        }
    }
    if path.is_empty() {
        if let Some(location) = entry.install_location.as_deref() {
            let location = location.trim();
            if !location.is_empty() && Path::new(location).is_dir() {
                path = location.to_string();
            }
        }
    }

    Some(InstalledApp {
        name: name.to_string(),
        version: entry.display_version.clone().unwrap_or_default(),
        path,
        uninstall_command: entry.uninstall_command().unwrap_or_default(),
    })
}

/// Drop later duplicates of the same (name, version) pair, keeping
/// first-seen order. Two installations sharing name and version collapse to
/// one entry even when their paths differ.
pub fn dedup_apps(apps: Vec<InstalledApp>) -> Vec<InstalledApp> {
    let mut seen = HashSet::new();
    apps.into_iter()
        .filter(|a| seen.insert((a.name.clone(), a.version.clone())))
        .collect()
}

/// Enumerates installed applications and drives open/close/uninstall
/// actions on them.
pub struct AppDirectory {
    processes: ProcessDirectory,
}

impl AppDirectory {
    pub fn new() -> Self {
        Self {
            processes: ProcessDirectory::new(),
        }
    }

    /// Rebuild the application list from the three Uninstall registry roots.
    /// Unreadable subtrees are skipped; off Windows the list is empty.
    pub fn list(&self) -> Vec<InstalledApp> {
        let raw = platform::read_uninstall_entries();
        let apps: Vec<InstalledApp> = raw.iter().filter_map(resolve_entry).collect();
        let apps = dedup_apps(apps);
        debug!("enumerated {} installed applications", apps.len());
        apps
    }

    /// Launch an application. `target` may be a file path, a `"name | path"`
    /// composite from a list row, or a bare name for the shell to resolve.
    /// Returns whether a launch was attempted successfully, not whether the
    /// application actually started.
    pub fn open(&self, target: &str) -> bool {
        let target = target.trim();
        if target.is_empty() {
            return false;
        }
        if Path::new(target).is_file() {
            return open::that(target).is_ok();
        }
        if let Some(embedded) = target.rsplit('|').next() {
            let embedded = embedded.trim();
            if embedded != target && Path::new(embedded).is_file() {
                return open::that(embedded).is_ok();
            }
        }
        platform::shell_launch(target)
    }

    /// Close an application by image name, `.exe` appended if absent. Bulk
    /// terminate (children included) first, then a per-process scan kill.
    pub fn close(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let image = if name.to_ascii_lowercase().ends_with(".exe") {
            name.to_string()
        } else {
            format!("{name}.exe")
        };
        self.processes.kill_by_name(&image)
    }

    /// Find `display_name` in the Uninstall roots (case-insensitive) and
    /// launch its uninstall command through the shell. Success means the
    /// command was launched; completion is not tracked.
    pub fn uninstall(&self, display_name: &str) -> bool {
        let wanted = display_name.trim().to_lowercase();
        for entry in platform::read_uninstall_entries() {
            let Some(name) = entry.display_name.as_deref() else {
                continue;
            };
            if name.trim().to_lowercase() != wanted {
                continue;
            }
            let Some(command) = entry.uninstall_command() else {
                continue;
            };
            info!("launching uninstaller for '{}'", name.trim());
            return platform::shell_command(&command);
        }
        false
    }
}

impl Default for AppDirectory {
    fn default() -> Self {
        Self::new()
    }
}
