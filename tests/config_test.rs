//! Integration tests for configuration loading

use nav_guidance::domain::types::RouterType;
use nav_guidance::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[snapshot]
completion_tolerance_pct = 1.5

[planning]
default_router = "pedestrian"

[runtime]
event_buffer = 64
metrics_interval_secs = 0

[replay]
file = "feeds/walk.jsonl"
pace_ms = 25
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.completion_tolerance_pct(), 1.5);
    assert_eq!(config.default_router(), RouterType::Pedestrian);
    assert_eq!(config.event_buffer(), 64);
    assert_eq!(config.metrics_interval_secs(), 0);
    assert_eq!(config.replay_file(), "feeds/walk.jsonl");
    assert_eq!(config.replay_pace_ms(), 25);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_invalid_file_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[snapshot]\ncompletion_tolerance_pct = \"lots\"\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.completion_tolerance_pct(), 0.5);
    assert_eq!(config.default_router(), RouterType::Vehicle);
    assert_eq!(config.event_buffer(), 256);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_load_from_path_rejects_invalid_values() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[runtime]\nevent_buffer = 0\n").unwrap();
    temp_file.flush().unwrap();

    // Falls back to defaults rather than running with a zero-capacity channel
    let config = Config::load_from_path(temp_file.path());
    assert_eq!(config.event_buffer(), 256);
}

#[test]
fn test_shipped_dev_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.replay_file(), "feeds/demo.jsonl");
}
