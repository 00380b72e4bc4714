//! Configuration loading and root folder resolution tests
//!
//! Uses serial_test to prevent ENV variable race conditions: tests that
//! touch COMPRANK_ROOT_FOLDER are marked #[serial].

use comprank_common::config::{
    ensure_root_folder, resolve_root_folder, TomlConfig, DATABASE_FILE, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_config_file_fields_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/comprank"
port = 8080
api_key = "sk-test"
model = "deepseek-chat"
requests_per_minute = 30
retry_backoff_ms = 250
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder.as_deref(), Some("/srv/comprank"));
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.requests_per_minute, Some(30));
    assert_eq!(config.retry_backoff_ms, Some(250));
    assert!(config.password_sha256.is_none());
}

#[test]
fn test_invalid_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(TomlConfig::load(&path).is_err());
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let toml_config = TomlConfig {
        root_folder: Some("/from/toml".to_string()),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, &toml_config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_default_used_without_overrides() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, &TomlConfig::default());
    assert!(!resolved.as_os_str().is_empty());
    assert!(resolved.to_string_lossy().contains("comprank"));
}

#[test]
fn test_ensure_root_folder_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("root");

    let db_path = ensure_root_folder(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE));
}
