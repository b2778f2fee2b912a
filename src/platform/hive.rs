//! Per-user hive tracking - sequencing of the hive access protocol
//!
//! The OS only mounts registry hives for interactively logged-in users.
//! Reaching another user's profile scope means resolving the account's SID,
//! probing `HKEY_USERS` for it, and loading the profile's `NTUSER.DAT` at a
//! fixed mount point when the OS has not. The sequencing lives here over
//! injectable probes; the Windows backend supplies the real ones.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Mount name under HKEY_USERS for hives loaded on demand.
pub const HIVE_MOUNT_POINT: &str = "WinadminHive";

/// Raw probes driven by the hive protocol.
pub trait HiveProbe {
    /// Resolve an account name to its SID.
    fn security_id(&mut self, username: &str) -> Option<String>;
    /// Whether the OS already has this SID's hive under HKEY_USERS.
    fn is_mounted(&mut self, sid: &str) -> bool;
    /// Profile directory recorded for the SID.
    fn profile_path(&mut self, sid: &str) -> Option<PathBuf>;
    /// Load a hive file at the fixed mount point; `true` on success.
    fn mount(&mut self, hive_file: &Path) -> bool;
}

/// Hives this process mounted itself, keyed by SID. Mounted hives stay
/// loaded for the life of the process.
#[derive(Default)]
pub struct UserHives {
    mounted: HashMap<String, String>,
}

impl UserHives {
    pub fn new() -> Self {
        Self {
            mounted: HashMap::new(),
        }
    }

    /// Name of the HKEY_USERS subtree holding `username`'s profile: a hive
    /// this process already mounted, the SID itself when the OS has it
    /// mounted, otherwise the result of at most one mount attempt of the
    /// profile's `NTUSER.DAT`. An unresolvable account or profile, or a
    /// failed mount, is `None`.
    pub fn resolve(&mut self, probe: &mut dyn HiveProbe, username: &str) -> Option<String> {
        let sid = probe.security_id(username)?;
        if let Some(mount) = self.mounted.get(&sid) {
            return Some(mount.clone());
        }
        if probe.is_mounted(&sid) {
            return Some(sid);
        }

        let hive_file = probe.profile_path(&sid)?.join("NTUSER.DAT");
        if !probe.mount(&hive_file) {
            warn!("failed to load hive for {} from {:?}", sid, hive_file);
            return None;
        }
        info!("loaded user hive for {} at {}", sid, HIVE_MOUNT_POINT);
        self.mounted.insert(sid, HIVE_MOUNT_POINT.to_string());
        Some(HIVE_MOUNT_POINT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Probe with scripted answers and a mount-attempt counter.
    struct ScriptedProbe {
        sid: Option<&'static str>,
        os_mounted: bool,
        profile: Option<&'static str>,
        mount_succeeds: bool,
        mount_calls: usize,
        last_hive_file: Option<PathBuf>,
    }

    impl ScriptedProbe {
        fn for_user() -> Self {
            Self {
                sid: Some("S-1-5-21-1"),
                os_mounted: false,
                profile: Some("/Users/alice"),
                mount_succeeds: true,
                mount_calls: 0,
                last_hive_file: None,
            }
        }
    }

    impl HiveProbe for ScriptedProbe {
        fn security_id(&mut self, _username: &str) -> Option<String> {
            self.sid.map(str::to_string)
        }

        fn is_mounted(&mut self, _sid: &str) -> bool {
            self.os_mounted
        }

        fn profile_path(&mut self, _sid: &str) -> Option<PathBuf> {
            self.profile.map(PathBuf::from)
        }

        fn mount(&mut self, hive_file: &Path) -> bool {
            self.mount_calls += 1;
            self.last_hive_file = Some(hive_file.to_path_buf());
            self.mount_succeeds
        }
    }

    #[test]
    fn unmounted_profile_is_mounted_exactly_once() {
        let mut hives = UserHives::new();
        let mut probe = ScriptedProbe::for_user();
        let mount = hives.resolve(&mut probe, "alice");
        assert_eq!(mount.as_deref(), Some(HIVE_MOUNT_POINT));
        assert_eq!(probe.mount_calls, 1);
        assert_eq!(
            probe.last_hive_file.as_deref(),
            Some(Path::new("/Users/alice/NTUSER.DAT"))
        );
    }

    #[test]
    fn a_hive_mounted_by_us_is_reused_without_remounting() {
        let mut hives = UserHives::new();
        let mut probe = ScriptedProbe::for_user();
        assert!(hives.resolve(&mut probe, "alice").is_some());
        let again = hives.resolve(&mut probe, "alice");
        assert_eq!(again.as_deref(), Some(HIVE_MOUNT_POINT));
        assert_eq!(probe.mount_calls, 1);
    }

    #[test]
    fn an_os_mounted_sid_is_used_directly() {
        let mut hives = UserHives::new();
        let mut probe = ScriptedProbe::for_user();
        probe.os_mounted = true;
        assert_eq!(hives.resolve(&mut probe, "alice").as_deref(), Some("S-1-5-21-1"));
        assert_eq!(probe.mount_calls, 0);
    }

    #[test]
    fn a_failed_mount_resolves_to_none_after_one_attempt() {
        let mut hives = UserHives::new();
        let mut probe = ScriptedProbe::for_user();
        probe.mount_succeeds = false;
        assert!(hives.resolve(&mut probe, "alice").is_none());
        assert_eq!(probe.mount_calls, 1);

        // A failed mount is not remembered as mounted.
        probe.mount_succeeds = true;
        assert!(hives.resolve(&mut probe, "alice").is_some());
        assert_eq!(probe.mount_calls, 2);
    }

    #[test]
    fn an_unknown_account_never_reaches_the_mount() {
        let mut hives = UserHives::new();
        let mut probe = ScriptedProbe::for_user();
        probe.sid = None;
        assert!(hives.resolve(&mut probe, "nobody").is_none());
        assert_eq!(probe.mount_calls, 0);
    }

    #[test]
    fn an_unresolvable_profile_never_reaches_the_mount() {
        let mut hives = UserHives::new();
        let mut probe = ScriptedProbe::for_user();
        probe.profile = None;
        assert!(hives.resolve(&mut probe, "alice").is_none());
        assert_eq!(probe.mount_calls, 0);
    }
}
