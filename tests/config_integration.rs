//! Configuration system integration tests for souschef.
//!
//! Tests load, save, and migration behaviour of the configuration system
//! using temporary files to avoid affecting the real config.

use std::fs;
use tempfile::TempDir;

use souschef::config::{load_config_from, save_config_to, EngineConfig};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.gesture.cooldown_ms, 1_500);
    assert_eq!(config.voice.max_start_attempts, 3);
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = EngineConfig::default();
    config.gesture.min_hold_frames = 3;
    config.gesture.cooldown_ms = 2_500;
    config.voice.enabled = false;
    config.dispatch.suppression_window_ms = 750;

    save_config_to(&path, &config).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert_eq!(loaded.gesture.min_hold_frames, 3);
    assert_eq!(loaded.gesture.cooldown_ms, 2_500);
    assert!(!loaded.voice.enabled);
    assert_eq!(loaded.dispatch.suppression_window_ms, 750);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("dir").join("config.json");

    save_config_to(&path, &EngineConfig::default()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{not json").unwrap();

    assert!(load_config_from(&path).is_err());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"version": 1, "voice": {"retry_backoff_ms": 500}}"#).unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.voice.retry_backoff_ms, 500);
    // Unspecified sections and fields come from the defaults.
    assert!(config.voice.enabled);
    assert_eq!(config.gesture.absence_reset_ms, 1_000);
    assert_eq!(config.gesture.classifier.point_min_distance, 40.0);
}

#[test]
fn test_old_version_is_migrated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"version": 0, "gesture": {"cooldown_ms": 900}}"#).unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.version, EngineConfig::default().version);
    // Values carried over through the migration.
    assert_eq!(config.gesture.cooldown_ms, 900);
}
