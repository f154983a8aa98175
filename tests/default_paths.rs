//! Environment overrides for the config and state file locations
//!
//! Serialized because they mutate process-wide environment variables.

use moor::config::AtomicConfigStore;
use moor::store::JsonFileStore;
use serial_test::serial;
use std::path::PathBuf;

#[test]
#[serial]
fn test_moor_config_overrides_config_path() {
    std::env::set_var("MOOR_CONFIG", "/tmp/moor-test/config.json");
    assert_eq!(
        AtomicConfigStore::default_path(),
        PathBuf::from("/tmp/moor-test/config.json")
    );
    std::env::remove_var("MOOR_CONFIG");
}

#[test]
#[serial]
fn test_moor_state_dir_overrides_store_path() {
    std::env::set_var("MOOR_STATE_DIR", "/tmp/moor-test");
    assert_eq!(
        JsonFileStore::default_path(),
        PathBuf::from("/tmp/moor-test/worktrees.json")
    );
    std::env::remove_var("MOOR_STATE_DIR");
}

#[test]
#[serial]
fn test_platform_defaults_without_overrides() {
    std::env::remove_var("MOOR_CONFIG");
    std::env::remove_var("MOOR_STATE_DIR");
    assert!(AtomicConfigStore::default_path().ends_with("moor/config.json"));
    assert!(JsonFileStore::default_path().ends_with("moor/worktrees.json"));
}
