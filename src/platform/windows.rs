//! Windows-specific registry, session and shell plumbing

use std::os::windows::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_QUERY_VALUE, KEY_READ};
use winreg::RegKey;

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Shutdown::LockWorkStation;
use windows::Win32::UI::Shell::IsUserAnAdmin;
use windows::Win32::UI::WindowsAndMessaging::{
    SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
};

use super::hive::{HiveProbe, UserHives, HIVE_MOUNT_POINT};
use crate::core::accounts::AccountCommand;
use crate::core::apps::UninstallEntry;
use crate::core::policy::{PolicyRegistry, PolicyScope, RegistryRead};

/// Keep helper commands from flashing console windows under a GUI host.
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

const POLICIES_ROOT: &str = r"Software\Microsoft\Windows\CurrentVersion\Policies";
const PROFILE_LIST: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\ProfileList";

fn command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

pub fn is_admin() -> bool {
    unsafe { IsUserAnAdmin().as_bool() }
}

/// Broadcast WM_SETTINGCHANGE ("Policy") to every top-level window.
pub fn broadcast_setting_change() {
    let section: Vec<u16> = "Policy\0".encode_utf16().collect();
    unsafe {
        SendMessageTimeoutW(
            HWND_BROADCAST,
            WM_SETTINGCHANGE,
            WPARAM(0),
            LPARAM(section.as_ptr() as isize),
            SMTO_ABORTIFHUNG,
            2000,
            None,
        );
    }
    debug!("broadcast WM_SETTINGCHANGE");
}

pub fn lock_workstation() -> bool {
    unsafe { LockWorkStation().is_ok() }
}

pub fn log_off() -> bool {
    command("shutdown").arg("/l").spawn().is_ok()
}

pub fn shutdown(restart: bool) -> Result<()> {
    let flag = if restart { "/r" } else { "/s" };
    let status = command("shutdown")
        .args([flag, "/t", "0"])
        .status()
        .context("failed to run shutdown")?;
    if status.success() {
        Ok(())
    } else {
        anyhow::bail!("shutdown exited with {status}")
    }
}

/// Kill explorer and bring it back so shell policies take effect visually.
pub fn restart_shell() -> Result<()> {
    let killed = command("taskkill")
        .args(["/F", "/IM", "explorer.exe"])
        .status()
        .context("failed to run taskkill")?;
    if !killed.success() {
        warn!("taskkill for explorer exited with {}", killed);
    }
    command("explorer.exe")
        .spawn()
        .context("failed to relaunch explorer")?;
    info!("desktop shell restarted");
    Ok(())
}

pub fn taskkill_image(image: &str) -> bool {
    command("taskkill")
        .args(["/IM", image, "/F", "/T"])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn shell_launch(target: &str) -> bool {
    command("cmd").args(["/C", "start", "", target]).spawn().is_ok()
}

pub fn shell_command(cmdline: &str) -> bool {
    command("cmd").args(["/C", cmdline]).spawn().is_ok()
}

/// Resolve an account name to its SID by scraping wmic output.
pub fn lookup_security_id(username: &str) -> Option<String> {
    let filter = format!("name='{}'", username.replace('\'', ""));
    let output = command("wmic")
        .args(["useraccount", "where", &filter, "get", "sid"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("S-"))
        .map(str::to_string)
}

fn profile_path_for_sid(sid: &str) -> Option<PathBuf> {
    let key = RegKey::predef(HKEY_LOCAL_MACHINE)
        .open_subkey(format!(r"{PROFILE_LIST}\{sid}"))
        .ok()?;
    let path: String = key.get_value("ProfileImagePath").ok()?;
    Some(PathBuf::from(path))
}

/// Live probes for the hive protocol: wmic for SIDs, HKEY_USERS for mount
/// checks, ProfileList for profile directories and `reg load` for mounting.
struct SystemHiveProbe;

impl HiveProbe for SystemHiveProbe {
    fn security_id(&mut self, username: &str) -> Option<String> {
        lookup_security_id(username)
    }

    fn is_mounted(&mut self, sid: &str) -> bool {
        // Logged-in users already have their hive mounted under the SID.
        RegKey::predef(HKEY_USERS).open_subkey(sid).is_ok()
    }

    fn profile_path(&mut self, sid: &str) -> Option<PathBuf> {
        profile_path_for_sid(sid)
    }

    fn mount(&mut self, hive_file: &std::path::Path) -> bool {
        let mount_path = format!(r"HKU\{HIVE_MOUNT_POINT}");
        command("reg")
            .args(["load", &mount_path, &hive_file.to_string_lossy()])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Policy registry over HKLM and per-user hives under HKEY_USERS.
///
/// The OS only mounts hives for interactively logged-in users; other users'
/// hives are loaded on demand with `reg load` and stay mounted for the
/// life of this process.
pub struct WindowsPolicyRegistry {
    hives: UserHives,
    probe: SystemHiveProbe,
}

impl WindowsPolicyRegistry {
    pub fn new() -> Self {
        Self {
            hives: UserHives::new(),
            probe: SystemHiveProbe,
        }
    }

    /// Root key and path prefix for a scope. User scope runs the two-phase
    /// access protocol: probe the SID under HKEY_USERS, and mount the
    /// profile hive when the OS has not.
    fn scope_prefix(&mut self, scope: &PolicyScope) -> Option<(RegKey, String)> {
        match scope {
            PolicyScope::Machine => Some((
                RegKey::predef(HKEY_LOCAL_MACHINE),
                POLICIES_ROOT.to_string(),
            )),
            PolicyScope::User(username) => {
                let hive = self.hives.resolve(&mut self.probe, username)?;
                Some((
                    RegKey::predef(HKEY_USERS),
                    format!(r"{hive}\{POLICIES_ROOT}"),
                ))
            }
        }
    }
}

impl Default for WindowsPolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRegistry for WindowsPolicyRegistry {
    fn read(&mut self, scope: &PolicyScope, subkey: &str, value_name: &str) -> RegistryRead {
        let Some((root, prefix)) = self.scope_prefix(scope) else {
            return RegistryRead::Unreadable;
        };
        let path = format!(r"{prefix}\{subkey}");
        match root.open_subkey_with_flags(&path, KEY_QUERY_VALUE) {
            Ok(key) => match key.get_value::<u32, _>(value_name) {
                Ok(value) => RegistryRead::Value(value),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryRead::Missing,
                Err(_) => RegistryRead::Unreadable,
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryRead::Missing,
            Err(_) => RegistryRead::Unreadable,
        }
    }

    fn write(&mut self, scope: &PolicyScope, subkey: &str, value_name: &str, data: u32) -> bool {
        let Some((root, prefix)) = self.scope_prefix(scope) else {
            return false;
        };
        let path = format!(r"{prefix}\{subkey}");
        match root.create_subkey(&path) {
            Ok((key, _disposition)) => key.set_value(value_name, &data).is_ok(),
            Err(e) => {
                warn!("could not open or create {}: {}", path, e);
                false
            }
        }
    }
}

/// `net user` backend for the account directory.
pub struct NetUserCommand;

impl AccountCommand for NetUserCommand {
    fn listing(&self) -> Option<String> {
        let output = command("net").arg("user").output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run(&self, args: &[String]) -> Result<(), String> {
        let output = command("net")
            .args(args)
            .output()
            .map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(())
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!("{} {}", stdout.trim(), stderr.trim())
                .trim()
                .to_string())
        }
    }
}

/// Scan the three fixed Uninstall roots. Unreadable subtrees are skipped.
pub fn read_uninstall_entries() -> Vec<UninstallEntry> {
    const ROOTS: &[(winreg::HKEY, &str)] = &[
        (
            HKEY_LOCAL_MACHINE,
            r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
        ),
        (
            HKEY_LOCAL_MACHINE,
            r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
        ),
        (
            HKEY_CURRENT_USER,
            r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
        ),
    ];

    let mut entries = Vec::new();
    for &(root, path) in ROOTS {
        let Ok(key) = RegKey::predef(root).open_subkey_with_flags(path, KEY_READ) else {
            continue;
        };
        for name in key.enum_keys().flatten() {
            let Ok(sub) = key.open_subkey_with_flags(&name, KEY_READ) else {
                continue;
            };
            entries.push(UninstallEntry {
                display_name: sub.get_value("DisplayName").ok(),
                display_version: sub.get_value("DisplayVersion").ok(),
                display_icon: sub.get_value("DisplayIcon").ok(),
                install_location: sub.get_value("InstallLocation").ok(),
                uninstall_string: sub.get_value("UninstallString").ok(),
                quiet_uninstall_string: sub.get_value("QuietUninstallString").ok(),
            });
        }
    }
    entries
}
