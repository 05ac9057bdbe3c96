//! Driver configuration loading tests.
//!
//! Exercises `DriverConfig::load()` against real files: defaults for omitted
//! sections, per-section overrides, missing files, syntax errors and
//! semantic validation.

use std::fs;
use tempfile::TempDir;
use tux_common::config::{ConfigError, ConfigLoader, DriverConfig, LogLevel};

/// Write `content` as driver.toml in a fresh directory.
fn write_driver_toml(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("driver.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn empty_file_loads_defaults() {
    let (_dir, path) = write_driver_toml("");
    let config = DriverConfig::load(&path).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Info);
    assert_eq!(config.usb.reconnect_delay_ms, 1000);
    assert_eq!(config.monitor.frozen_frame_limit, 10);
    assert_eq!(config.battery.low_mv, 4650.0);
    assert_eq!(config.reflash.erase_wait_s, 10.0);
    config.validate().unwrap();
}

#[test]
fn sections_override_defaults() {
    let (_dir, path) = write_driver_toml(
        r#"
[shared]
log_level = "debug"
service_name = "tux-bench"

[usb]
transport = "hid"
read_interval_ms = 50

[monitor]
check_frame_id = true
connection_quality = true

[battery]
full_mv = 5100.0

[reflash]
playback_device = "hw:2,0"
erase_wait_s = 0.0
"#,
    );
    let config = DriverConfig::load(&path).unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "tux-bench");
    assert_eq!(config.usb.transport, "hid");
    assert_eq!(config.usb.read_interval_ms, 50);
    assert_eq!(config.usb.vendor_id, 0x03EB);
    assert!(config.monitor.check_frame_id);
    assert!(config.monitor.connection_quality);
    assert_eq!(config.battery.full_mv, 5100.0);
    assert_eq!(config.battery.high_mv, 4800.0);
    assert_eq!(config.reflash.playback_device, "hw:2,0");
    assert_eq!(config.reflash.erase_wait_s, 0.0);
    config.validate().unwrap();
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let result = DriverConfig::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound)));
}

#[test]
fn syntax_error_is_parse_error() {
    let (_dir, path) = write_driver_toml("[usb\nvendor_id = ");
    assert!(matches!(
        DriverConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn wrong_type_is_parse_error() {
    let (_dir, path) = write_driver_toml("[usb]\nread_interval_ms = \"fast\"\n");
    assert!(matches!(
        DriverConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn loaded_config_fails_validation() {
    let (_dir, path) = write_driver_toml("[battery]\nlow_mv = 4900.0\n");
    let config = DriverConfig::load(&path).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
