//! Configuration loading and root folder resolution
//!
//! Tests that manipulate CURTAIN_ROOT_FOLDER are marked #[serial] so they do not
//! race each other on the process environment.

use curtain_common::config::{
    database_path, load_toml_config, resolve_root_folder, ROOT_FOLDER_ENV,
};
use curtain_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolved = resolve_root_folder(
        Some(Path::new("/from/cli")),
        ROOT_FOLDER_ENV,
        Some(Path::new("/from/toml")),
    );

    assert_eq!(resolved, PathBuf::from("/from/cli"));
    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, Some(Path::new("/from/toml")));

    assert_eq!(resolved, PathBuf::from("/from/env"));
    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, Some(Path::new("/from/toml")));

    assert_eq!(resolved, PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_default_root_folder_is_named_curtain() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolved = resolve_root_folder(None, ROOT_FOLDER_ENV, None);

    assert!(!resolved.as_os_str().is_empty());
    assert!(resolved.to_string_lossy().contains("curtain"));
}

#[test]
fn test_load_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/curtain"
        port = 8088

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path)).unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/curtain")));
    assert_eq!(config.port, 8088);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        database_path(config.root_folder.as_deref().unwrap()),
        PathBuf::from("/srv/curtain/curtain.db")
    );
}

#[test]
fn test_missing_explicit_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let result = load_toml_config(Some(&path));

    assert!(matches!(result, Err(Error::Config(_))));
}
