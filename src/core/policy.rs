//! Policy store - named boolean restrictions backed by the Windows registry
//!
//! Each managed flag is a DWORD below
//! `Software\Microsoft\Windows\CurrentVersion\Policies\`, at either machine
//! scope (HKLM) or a specific user's profile scope (HKEY_USERS). Reads are
//! never cached; a value that has never been written reads as `Allowed`.

use tracing::{info, warn};

use crate::platform;

/// Where a policy flag lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyScope {
    /// Machine-wide policies under HKLM. Writing requires elevation.
    Machine,
    /// A specific user's per-profile policies, addressed by account name.
    User(String),
}

/// Tri-state result of reading a policy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    /// The restriction is active (DWORD 1).
    Blocked,
    /// The restriction is inactive, or the value has never been written.
    Allowed,
    /// The scope could not be read at all.
    Unreadable,
}

/// Static description of one managed policy flag. The table is fixed at
/// store construction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct PolicyDescriptor {
    /// Identifier used by callers.
    pub key: &'static str,
    /// Subtree below the Policies root.
    pub subkey: &'static str,
    /// Registry value name holding the DWORD.
    pub value_name: &'static str,
}

/// Result of one raw registry read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryRead {
    Value(u32),
    /// Key or value absent - reads as `Allowed` by convention.
    Missing,
    /// Scope inaccessible.
    Unreadable,
}

/// Raw access to a policy registry.
///
/// The Windows implementation performs the per-user hive mounting behind
/// these two calls; every failure collapses to `Unreadable`/`false` and
/// never propagates.
pub trait PolicyRegistry {
    fn read(&mut self, scope: &PolicyScope, subkey: &str, value_name: &str) -> RegistryRead;
    /// Create the destination subtree if needed and write a DWORD.
    fn write(&mut self, scope: &PolicyScope, subkey: &str, value_name: &str, data: u32) -> bool;
}

/// The managed flags, all below
/// `Software\Microsoft\Windows\CurrentVersion\Policies\`.
pub fn default_policy_table() -> Vec<PolicyDescriptor> {
    vec![
        PolicyDescriptor {
            key: "DisableTaskMgr",
            subkey: "System",
            value_name: "DisableTaskMgr",
        },
        PolicyDescriptor {
            key: "NoControlPanel",
            subkey: "Explorer",
            value_name: "NoControlPanel",
        },
        PolicyDescriptor {
            key: "NoRun",
            subkey: "Explorer",
            value_name: "NoRun",
        },
        PolicyDescriptor {
            key: "DisableRegistryTools",
            subkey: "System",
            value_name: "DisableRegistryTools",
        },
    ]
}

/// Get/set adapter for the managed policy flags.
pub struct PolicyStore {
    table: Vec<PolicyDescriptor>,
    registry: Box<dyn PolicyRegistry>,
}

impl PolicyStore {
    /// Store over the platform registry with the default flag table.
    pub fn new() -> Self {
        Self::with_registry(default_policy_table(), platform::policy_registry())
    }

    /// Store over a caller-provided table and registry backend.
    pub fn with_registry(table: Vec<PolicyDescriptor>, registry: Box<dyn PolicyRegistry>) -> Self {
        Self { table, registry }
    }

    /// Keys of every managed flag, in table order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|d| d.key)
    }

    /// Read one flag fresh. Unknown keys and inaccessible scopes read as
    /// `Unreadable`; a missing value reads as `Allowed`.
    pub fn get(&mut self, key: &str, scope: &PolicyScope) -> PolicyState {
        let Some(desc) = self.table.iter().find(|d| d.key == key).cloned() else {
            return PolicyState::Unreadable;
        };
        match self.registry.read(scope, desc.subkey, desc.value_name) {
            RegistryRead::Value(0) | RegistryRead::Missing => PolicyState::Allowed,
            RegistryRead::Value(_) => PolicyState::Blocked,
            RegistryRead::Unreadable => PolicyState::Unreadable,
        }
    }

    /// Write one flag; `true` on success. Machine scope needs elevation, and
    /// the destination subtree is created when absent.
    pub fn set(&mut self, key: &str, blocked: bool, scope: &PolicyScope) -> bool {
        let Some(desc) = self.table.iter().find(|d| d.key == key).cloned() else {
            return false;
        };
        let data = u32::from(blocked);
        let ok = self
            .registry
            .write(scope, desc.subkey, desc.value_name, data);
        if ok {
            info!("policy '{}' set to {} ({:?})", key, data, scope);
        } else {
            warn!("policy '{}' write failed ({:?})", key, scope);
        }
        ok
    }

    /// Current state of every managed flag, read fresh.
    pub fn states(&mut self, scope: &PolicyScope) -> Vec<(&'static str, PolicyState)> {
        let keys: Vec<&'static str> = self.keys().collect();
        keys.into_iter().map(|k| (k, self.get(k, scope))).collect()
    }

    /// Set every managed flag to `Allowed`. Every key is attempted even
    /// after a failure; the result is the AND across all writes.
    pub fn reset_all_to_allowed(&mut self, scope: &PolicyScope) -> bool {
        let keys: Vec<&'static str> = self.keys().collect();
        let mut ok = true;
        for key in keys {
            if !self.set(key, false, scope) {
                ok = false;
            }
        }
        ok
    }

    /// Make policy changes observable without a reboot: broadcast the
    /// system-wide settings-changed notification (always attempted) and
    /// optionally restart the desktop shell. Both are best-effort.
    pub fn apply_changes(&self, restart_shell: bool) {
        platform::broadcast_setting_change();
        if restart_shell {
            if let Err(e) = platform::restart_shell() {
                warn!("shell restart failed: {}", e);
            }
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}
