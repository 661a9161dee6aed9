use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hystore_core::registry::{DEFAULT_REPOSITORIES, RegistryEvent, RepoRegistry};
use hystore_core::state::{CUSTOM_REPOS_KEY, JsonFileStore, KeyValueStore};
use tempfile::TempDir;

fn registry_at(temp: &TempDir) -> RepoRegistry {
    let store = JsonFileStore::new(temp.path().join("state.json"));
    RepoRegistry::with_builtin_defaults(Arc::new(store))
}

#[test]
fn first_load_seeds_and_persists_defaults() {
    let temp = TempDir::new().unwrap();

    let repos = registry_at(&temp).load();
    assert_eq!(repos.len(), DEFAULT_REPOSITORIES.len());

    let raw = std::fs::read_to_string(temp.path().join("state.json")).unwrap();
    let state: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let stored: Vec<String> =
        serde_json::from_str(state[CUSTOM_REPOS_KEY].as_str().unwrap()).unwrap();
    assert_eq!(stored, repos);
}

#[test]
fn emptied_list_is_never_reseeded() {
    let temp = TempDir::new().unwrap();
    let registry = registry_at(&temp);

    for url in registry.load() {
        registry.remove(&url).unwrap();
    }

    assert!(registry_at(&temp).load().is_empty());
}

#[test]
fn mutations_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let registry = registry_at(&temp);
    registry.load();

    registry.add("  https://mine.example/apps.json  ").unwrap();
    registry.remove(DEFAULT_REPOSITORIES[0]).unwrap();

    let reopened = registry_at(&temp).load();
    assert_eq!(reopened.last().unwrap(), "https://mine.example/apps.json");
    assert!(!reopened.iter().any(|url| url == DEFAULT_REPOSITORIES[0]));
    assert_eq!(reopened.len(), DEFAULT_REPOSITORIES.len());
}

#[test]
fn duplicates_are_kept_and_removed_together() {
    let temp = TempDir::new().unwrap();
    let registry = registry_at(&temp);
    let before = registry.load();

    registry.add("https://dup.example").unwrap();
    let report = registry.add("https://dup.example").unwrap();
    assert_eq!(
        report
            .repositories
            .iter()
            .filter(|url| *url == "https://dup.example")
            .count(),
        2
    );

    let report = registry.remove("https://dup.example").unwrap();
    assert!(report.changed);
    assert_eq!(report.repositories, before);
}

#[test]
fn add_then_remove_restores_list() {
    let temp = TempDir::new().unwrap();
    let registry = registry_at(&temp);
    registry.remove(DEFAULT_REPOSITORIES[2]).unwrap();
    registry.add(DEFAULT_REPOSITORIES[2]).unwrap();
    let before = registry.load();

    registry.add("https://mine.example/apps.json").unwrap();
    let report = registry.remove("https://mine.example/apps.json").unwrap();

    assert_eq!(report.repositories, before);
    assert_eq!(registry_at(&temp).load(), before);
}

#[test]
fn reset_restores_defaults_after_edits() {
    let temp = TempDir::new().unwrap();
    let registry = registry_at(&temp);
    registry.load();
    registry.add("https://mine.example").unwrap();

    let report = registry.reset_to_default().unwrap();

    assert!(report.changed);
    assert_eq!(registry_at(&temp).load(), report.repositories);
    assert_eq!(report.repositories.len(), DEFAULT_REPOSITORIES.len());
}

#[test]
fn subscribers_see_committed_state() {
    let temp = TempDir::new().unwrap();
    let registry = Arc::new(registry_at(&temp));
    registry.load();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let _subscription = {
        let seen = Arc::clone(&seen);
        let path = temp.path().join("state.json");
        registry.subscribe(move |event| {
            assert_eq!(event, RegistryEvent::ReposChanged);
            let store = JsonFileStore::new(path.clone());
            seen.lock().unwrap().push(store.get(CUSTOM_REPOS_KEY).unwrap());
        })
    };

    registry.add("https://fresh.example").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].as_deref().unwrap().contains("https://fresh.example"));
}

#[test]
fn blank_add_neither_writes_nor_notifies() {
    let temp = TempDir::new().unwrap();
    let registry = registry_at(&temp);
    let before = registry.load();

    let fired = Arc::new(AtomicUsize::new(0));
    let _subscription = {
        let fired = Arc::clone(&fired);
        registry.subscribe(move |_| {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    };
    let modified = std::fs::metadata(temp.path().join("state.json"))
        .unwrap()
        .modified()
        .unwrap();

    let report = registry.add("   ").unwrap();

    assert!(!report.changed);
    assert_eq!(report.repositories, before);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(
        std::fs::metadata(temp.path().join("state.json"))
            .unwrap()
            .modified()
            .unwrap(),
        modified
    );
}

#[test]
fn corrupt_state_fails_open_on_load_and_closed_on_mutation() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("state.json"), "not json").unwrap();
    let registry = registry_at(&temp);

    assert!(registry.load().is_empty());
    assert!(registry.add("https://mine.example").is_err());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("state.json")).unwrap(),
        "not json"
    );
}
