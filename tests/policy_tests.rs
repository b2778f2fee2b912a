use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use winadmin::core::policy::{
    default_policy_table, PolicyRegistry, PolicyScope, PolicyState, PolicyStore, RegistryRead,
};

/// In-memory registry shared with the test through an `Rc` handle.
#[derive(Default)]
struct RegistryInner {
    values: HashMap<(String, String, String), u32>,
    unreadable: bool,
    read_only: bool,
    write_calls: usize,
}

#[derive(Clone, Default)]
struct MemoryRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

fn scope_label(scope: &PolicyScope) -> String {
    match scope {
        PolicyScope::Machine => "machine".to_string(),
        PolicyScope::User(name) => format!("user:{name}"),
    }
}

impl PolicyRegistry for MemoryRegistry {
    fn read(&mut self, scope: &PolicyScope, subkey: &str, value_name: &str) -> RegistryRead {
        let inner = self.inner.borrow();
        if inner.unreadable {
            return RegistryRead::Unreadable;
        }
        match inner
            .values
            .get(&(scope_label(scope), subkey.to_string(), value_name.to_string()))
        {
            Some(&value) => RegistryRead::Value(value),
            None => RegistryRead::Missing,
        }
    }

    fn write(&mut self, scope: &PolicyScope, subkey: &str, value_name: &str, data: u32) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.write_calls += 1;
        if inner.unreadable || inner.read_only {
            return false;
        }
        inner.values.insert(
            (scope_label(scope), subkey.to_string(), value_name.to_string()),
            data,
        );
        true
    }
}

fn store() -> (PolicyStore, MemoryRegistry) {
    let registry = MemoryRegistry::default();
    let store = PolicyStore::with_registry(default_policy_table(), Box::new(registry.clone()));
    (store, registry)
}

#[test]
fn missing_value_reads_allowed_for_every_key() {
    let (mut store, _registry) = store();
    let keys: Vec<_> = store.keys().collect();
    for key in keys {
        assert_eq!(
            store.get(key, &PolicyScope::Machine),
            PolicyState::Allowed,
            "{key} should read Allowed when never written"
        );
    }
}

#[test]
fn set_then_get_round_trips_every_key() {
    let (mut store, _registry) = store();
    let keys: Vec<_> = store.keys().collect();
    for key in &keys {
        assert!(store.set(key, true, &PolicyScope::Machine));
        assert_eq!(store.get(key, &PolicyScope::Machine), PolicyState::Blocked);
    }
    for key in &keys {
        assert!(store.set(key, false, &PolicyScope::Machine));
        assert_eq!(store.get(key, &PolicyScope::Machine), PolicyState::Allowed);
    }
}

#[test]
fn norun_writes_dword_one_under_explorer() {
    let (mut store, registry) = store();
    assert!(store.set("NoRun", true, &PolicyScope::Machine));
    assert_eq!(store.get("NoRun", &PolicyScope::Machine), PolicyState::Blocked);

    let inner = registry.inner.borrow();
    assert_eq!(
        inner.values.get(&(
            "machine".to_string(),
            "Explorer".to_string(),
            "NoRun".to_string()
        )),
        Some(&1)
    );
}

#[test]
fn unreadable_scope_reports_unreadable() {
    let (mut store, registry) = store();
    registry.inner.borrow_mut().unreadable = true;
    assert_eq!(
        store.get("DisableTaskMgr", &PolicyScope::Machine),
        PolicyState::Unreadable
    );
}

#[test]
fn failed_write_reports_false_and_leaves_state_unchanged() {
    let (mut store, registry) = store();
    registry.inner.borrow_mut().read_only = true;
    assert!(!store.set("NoControlPanel", true, &PolicyScope::Machine));
    registry.inner.borrow_mut().read_only = false;
    assert_eq!(
        store.get("NoControlPanel", &PolicyScope::Machine),
        PolicyState::Allowed
    );
}

#[test]
fn reset_attempts_every_key_even_after_a_failure() {
    let (mut store, registry) = store();
    registry.inner.borrow_mut().read_only = true;
    assert!(!store.reset_all_to_allowed(&PolicyScope::Machine));
    assert_eq!(registry.inner.borrow().write_calls, 4);
}

#[test]
fn reset_leaves_every_key_allowed_when_writes_succeed() {
    let (mut store, _registry) = store();
    let keys: Vec<_> = store.keys().collect();
    for key in &keys {
        store.set(key, true, &PolicyScope::Machine);
    }
    assert!(store.reset_all_to_allowed(&PolicyScope::Machine));
    for (key, state) in store.states(&PolicyScope::Machine) {
        assert_eq!(state, PolicyState::Allowed, "{key} should be Allowed");
    }
}

#[test]
fn user_scope_is_independent_of_machine_scope() {
    let (mut store, _registry) = store();
    let user = PolicyScope::User("alice".to_string());
    assert!(store.set("NoRun", true, &user));
    assert_eq!(store.get("NoRun", &user), PolicyState::Blocked);
    assert_eq!(store.get("NoRun", &PolicyScope::Machine), PolicyState::Allowed);
}

#[test]
fn unknown_key_is_unreadable_and_unsettable() {
    let (mut store, registry) = store();
    assert_eq!(
        store.get("NotAPolicy", &PolicyScope::Machine),
        PolicyState::Unreadable
    );
    assert!(!store.set("NotAPolicy", true, &PolicyScope::Machine));
    assert_eq!(registry.inner.borrow().write_calls, 0);
}

#[cfg(not(windows))]
#[test]
fn platform_registry_is_unreadable_off_windows() {
    let mut store = PolicyStore::new();
    assert_eq!(
        store.get("DisableTaskMgr", &PolicyScope::Machine),
        PolicyState::Unreadable
    );
    assert!(!store.set("DisableTaskMgr", true, &PolicyScope::Machine));
}
