use std::env;
use std::fs;
use tempfile::TempDir;

use sharepool::OpenMode;

/// Test loading configuration from YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
share: backups
path: images/vm-image.bin
mode: create_truncate
open_timeout: 15
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = sharepool::config::load_from_yaml(&config_path).unwrap();

    assert_eq!(config.share, "backups");
    assert_eq!(config.path, "images/vm-image.bin");
    assert_eq!(config.mode, OpenMode::CreateTruncate);
    assert_eq!(config.open_timeout, 15);
}

/// Test loading configuration from environment variables
#[test]
fn test_load_env_config() {
    // Save original env vars
    let orig_share = env::var("SHAREPOOL_SHARE").ok();
    let orig_path = env::var("SHAREPOOL_PATH").ok();
    let orig_mode = env::var("SHAREPOOL_MODE").ok();
    let orig_timeout = env::var("SHAREPOOL_OPEN_TIMEOUT").ok();

    // Set test env vars
    env::set_var("SHAREPOOL_SHARE", "media");
    env::set_var("SHAREPOOL_PATH", "upload.dat");
    env::set_var("SHAREPOOL_MODE", "write");
    env::set_var("SHAREPOOL_OPEN_TIMEOUT", "45");

    let config = sharepool::config::load_from_env().unwrap();

    assert_eq!(config.share, "media");
    assert_eq!(config.path, "upload.dat");
    assert_eq!(config.mode, OpenMode::Write);
    assert_eq!(config.open_timeout, 45);

    // Restore original env vars
    cleanup_env("SHAREPOOL_SHARE", orig_share);
    cleanup_env("SHAREPOOL_PATH", orig_path);
    cleanup_env("SHAREPOOL_MODE", orig_mode);
    cleanup_env("SHAREPOOL_OPEN_TIMEOUT", orig_timeout);
}

/// Test default values
#[test]
fn test_default_values() {
    let yaml = r#"
share: media
path: upload.dat
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = sharepool::config::load_from_yaml(&config_path).unwrap();

    // Should use default mode and timeout
    assert_eq!(config.mode, OpenMode::Write);
    assert_eq!(config.open_timeout, 30);
}

/// Test that a missing config file is reported with context
#[test]
fn test_missing_config_file() {
    let err = sharepool::config::load_from_yaml("/nonexistent/config.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Helper function to cleanup environment variables
fn cleanup_env(key: &str, orig_val: Option<String>) {
    match orig_val {
        Some(val) => env::set_var(key, val),
        None => env::remove_var(key),
    }
}
