use std::fs::File;

use winadmin::core::apps::{dedup_apps, resolve_entry, InstalledApp, UninstallEntry};

fn app(name: &str, version: &str, path: &str) -> InstalledApp {
    InstalledApp {
        name: name.to_string(),
        version: version.to_string(),
        path: path.to_string(),
        uninstall_command: String::new(),
    }
}

#[test]
fn duplicates_by_name_and_version_collapse_to_first_seen() {
    let apps = vec![
        app("Tool", "1.0", r"C:\one"),
        app("Tool", "1.0", r"C:\two"),
        app("Tool", "2.0", ""),
        app("Other", "1.0", ""),
    ];
    let deduped = dedup_apps(apps);
    assert_eq!(deduped.len(), 3);
    assert_eq!(deduped[0].path, r"C:\one");

    // No identical (name, version) pair survives.
    for (i, a) in deduped.iter().enumerate() {
        for b in &deduped[i + 1..] {
            assert!(a.name != b.name || a.version != b.version);
        }
    }
}

#[test]
fn entries_without_a_display_name_are_dropped() {
    assert!(resolve_entry(&UninstallEntry::default()).is_none());
    let blank = UninstallEntry {
        display_name: Some("   ".to_string()),
        ..Default::default()
    };
    assert!(resolve_entry(&blank).is_none());
}

#[test]
fn icon_path_is_preferred_when_the_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("app.exe");
    File::create(&exe).unwrap();

    let entry = UninstallEntry {
        display_name: Some("App".to_string()),
        display_icon: Some(format!("\"{}\",0", exe.display())),
        install_location: Some(dir.path().display().to_string()),
        ..Default::default()
    };
    let resolved = resolve_entry(&entry).unwrap();
    assert_eq!(resolved.path, exe.display().to_string());
}

#[test]
fn install_location_is_the_fallback_path() {
    let dir = tempfile::tempdir().unwrap();
    let entry = UninstallEntry {
        display_name: Some("App".to_string()),
        display_icon: Some(r"C:\missing\app.exe,0".to_string()),
        install_location: Some(dir.path().display().to_string()),
        ..Default::default()
    };
    let resolved = resolve_entry(&entry).unwrap();
    assert_eq!(resolved.path, dir.path().display().to_string());
}

#[test]
fn unresolvable_paths_leave_the_guess_empty() {
    let entry = UninstallEntry {
        display_name: Some("App".to_string()),
        display_icon: Some(r"C:\missing\app.exe".to_string()),
        install_location: Some(r"C:\also\missing".to_string()),
        ..Default::default()
    };
    assert_eq!(resolve_entry(&entry).unwrap().path, "");
}

#[test]
fn quiet_uninstall_command_wins_over_interactive() {
    let entry = UninstallEntry {
        display_name: Some("App".to_string()),
        uninstall_string: Some("uninstall.exe".to_string()),
        quiet_uninstall_string: Some("uninstall.exe /S".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve_entry(&entry).unwrap().uninstall_command,
        "uninstall.exe /S"
    );

    let empty_quiet = UninstallEntry {
        quiet_uninstall_string: Some("  ".to_string()),
        ..entry
    };
    assert_eq!(
        resolve_entry(&empty_quiet).unwrap().uninstall_command,
        "uninstall.exe"
    );
}

#[cfg(not(windows))]
mod off_windows {
    use winadmin::core::apps::AppDirectory;

    #[test]
    fn listing_is_empty_without_a_registry() {
        assert!(AppDirectory::new().list().is_empty());
    }

    #[test]
    fn open_of_an_unresolvable_name_reports_failure() {
        assert!(!AppDirectory::new().open("winadmin-no-such-app"));
        assert!(!AppDirectory::new().open(""));
    }

    #[test]
    fn uninstall_of_an_unknown_app_reports_failure() {
        assert!(!AppDirectory::new().uninstall("Winadmin No Such App"));
    }
}
