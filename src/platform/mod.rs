//! Platform-specific calls behind a uniform, non-panicking facade
//!
//! Windows gets the real implementations; everywhere else every operation
//! degrades to its documented sentinel (`false`, `None`, empty, Unreadable)
//! so the adapters stay usable in tests and cross-platform hosts.

pub mod hive;
#[cfg(windows)]
pub mod windows;

use anyhow::Result;

use crate::core::accounts::AccountCommand;
use crate::core::apps::UninstallEntry;
use crate::core::policy::PolicyRegistry;

/// Whether the current process has administrator privileges.
pub fn is_admin() -> bool {
    #[cfg(windows)]
    {
        windows::is_admin()
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Current interactive username, falling back through environment variables.
pub fn current_user() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Registry backend for the policy store.
pub fn policy_registry() -> Box<dyn PolicyRegistry> {
    #[cfg(windows)]
    {
        Box::new(windows::WindowsPolicyRegistry::new())
    }
    #[cfg(not(windows))]
    {
        Box::new(fallback::UnsupportedRegistry)
    }
}

/// Command backend for the account directory.
pub fn account_command() -> Box<dyn AccountCommand> {
    #[cfg(windows)]
    {
        Box::new(windows::NetUserCommand)
    }
    #[cfg(not(windows))]
    {
        Box::new(fallback::UnsupportedAccountCommand)
    }
}

/// Broadcast the system-wide settings-changed notification so running
/// programs re-read policy. Best-effort.
pub fn broadcast_setting_change() {
    #[cfg(windows)]
    windows::broadcast_setting_change();
    #[cfg(not(windows))]
    tracing::debug!("settings-change broadcast skipped: not Windows");
}

/// Kill and relaunch the desktop shell so policy changes show immediately.
pub fn restart_shell() -> Result<()> {
    #[cfg(windows)]
    {
        windows::restart_shell()
    }
    #[cfg(not(windows))]
    {
        anyhow::bail!("shell restart is only supported on Windows")
    }
}

/// Bulk terminate-by-image-name, child processes included.
pub fn taskkill_image(image: &str) -> bool {
    #[cfg(windows)]
    {
        windows::taskkill_image(image)
    }
    #[cfg(not(windows))]
    {
        let _ = image;
        false
    }
}

/// Raw entries from the three Uninstall registry roots.
pub fn read_uninstall_entries() -> Vec<UninstallEntry> {
    #[cfg(windows)]
    {
        windows::read_uninstall_entries()
    }
    #[cfg(not(windows))]
    {
        Vec::new()
    }
}

/// Ask the shell to resolve and launch `target` by name.
pub fn shell_launch(target: &str) -> bool {
    #[cfg(windows)]
    {
        windows::shell_launch(target)
    }
    #[cfg(not(windows))]
    {
        let _ = target;
        false
    }
}

/// Run a vendor-provided command line through the shell, fire-and-forget.
pub fn shell_command(command: &str) -> bool {
    #[cfg(windows)]
    {
        windows::shell_command(command)
    }
    #[cfg(not(windows))]
    {
        let _ = command;
        false
    }
}

/// Lock the interactive workstation.
pub fn lock_workstation() -> bool {
    #[cfg(windows)]
    {
        windows::lock_workstation()
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Log the current user off.
pub fn log_off() -> bool {
    #[cfg(windows)]
    {
        windows::log_off()
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Immediate shutdown, or restart when `restart` is set.
pub fn shutdown(restart: bool) -> Result<()> {
    #[cfg(windows)]
    {
        windows::shutdown(restart)
    }
    #[cfg(not(windows))]
    {
        let _ = restart;
        anyhow::bail!("shutdown is only supported on Windows")
    }
}

/// Resolve a username to its security identifier via the local account
/// directory.
pub fn lookup_security_id(username: &str) -> Option<String> {
    #[cfg(windows)]
    {
        windows::lookup_security_id(username)
    }
    #[cfg(not(windows))]
    {
        let _ = username;
        None
    }
}

#[cfg(not(windows))]
mod fallback {
    use crate::core::accounts::AccountCommand;
    use crate::core::policy::{PolicyRegistry, PolicyScope, RegistryRead};

    /// Every policy scope is unreadable off Windows.
    pub struct UnsupportedRegistry;

    impl PolicyRegistry for UnsupportedRegistry {
        fn read(&mut self, _scope: &PolicyScope, _subkey: &str, _value_name: &str) -> RegistryRead {
            RegistryRead::Unreadable
        }

        fn write(
            &mut self,
            _scope: &PolicyScope,
            _subkey: &str,
            _value_name: &str,
            _data: u32,
        ) -> bool {
            false
        }
    }

    /// Every account command fails off Windows.
    pub struct UnsupportedAccountCommand;

    impl AccountCommand for UnsupportedAccountCommand {
        fn listing(&self) -> Option<String> {
            None
        }

        fn run(&self, _args: &[String]) -> Result<(), String> {
            Err("local account management is only supported on Windows".to_string())
        }
    }
}
