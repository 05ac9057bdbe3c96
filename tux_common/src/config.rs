//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for the driver and its tools.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tux_common::config::{ConfigLoader, DriverConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = DriverConfig::load(Path::new("driver.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    BATTERY_FULL_MV, BATTERY_HIGH_MV, BATTERY_LOW_MV, DRIVER_SERVICE_NAME, EMPTY_FRAME_LIMIT,
    FROZEN_FRAME_LIMIT, READ_INTERVAL_MS, RECONNECT_DELAY_MS, TUX_PID, TUX_VID,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    DRIVER_SERVICE_NAME.to_string()
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "tuxdriver-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_vendor_id() -> u16 {
    TUX_VID
}

fn default_product_id() -> u16 {
    TUX_PID
}

fn default_transport() -> String {
    "simulation".to_string()
}

fn default_read_interval_ms() -> u64 {
    READ_INTERVAL_MS
}

fn default_reconnect_delay_ms() -> u64 {
    RECONNECT_DELAY_MS
}

/// `[usb]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbConfig {
    /// Dongle vendor identifier.
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    /// Dongle product identifier.
    #[serde(default = "default_product_id")]
    pub product_id: u16,
    /// Registered transport name.
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Polling period in milliseconds.
    #[serde(default = "default_read_interval_ms")]
    pub read_interval_ms: u64,
    /// Delay between two acquisition attempts in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            transport: default_transport(),
            read_interval_ms: default_read_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

fn default_empty_frame_limit() -> u32 {
    EMPTY_FRAME_LIMIT
}

fn default_frozen_frame_limit() -> u32 {
    FROZEN_FRAME_LIMIT
}

/// `[monitor]` section: link anomaly detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Consecutive empty reports before the link is kicked.
    #[serde(default = "default_empty_frame_limit")]
    pub empty_frame_limit: u32,
    /// Consecutive repeated frame ids before the RF link is reset.
    #[serde(default = "default_frozen_frame_limit")]
    pub frozen_frame_limit: u32,
    /// Skip reports whose frame id repeats.
    #[serde(default)]
    pub check_frame_id: bool,
    /// Send periodic pings to measure the connection quality.
    #[serde(default)]
    pub connection_quality: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            empty_frame_limit: default_empty_frame_limit(),
            frozen_frame_limit: default_frozen_frame_limit(),
            check_frame_id: false,
            connection_quality: false,
        }
    }
}

fn default_full_mv() -> f32 {
    BATTERY_FULL_MV
}

fn default_high_mv() -> f32 {
    BATTERY_HIGH_MV
}

fn default_low_mv() -> f32 {
    BATTERY_LOW_MV
}

fn default_event_delta_mv() -> f32 {
    100.0
}

/// `[battery]` section: state cutoffs in millivolts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Lowest level classified FULL.
    #[serde(default = "default_full_mv")]
    pub full_mv: f32,
    /// Lowest level classified HIGH.
    #[serde(default = "default_high_mv")]
    pub high_mv: f32,
    /// Lowest level classified LOW.
    #[serde(default = "default_low_mv")]
    pub low_mv: f32,
    /// Minimal change before the level is evented.
    #[serde(default = "default_event_delta_mv")]
    pub event_delta_mv: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            full_mv: default_full_mv(),
            high_mv: default_high_mv(),
            low_mv: default_low_mv(),
            event_delta_mv: default_event_delta_mv(),
        }
    }
}

fn default_playback_device() -> String {
    "plughw:TuxDroid".to_string()
}

fn default_erase_wait_s() -> f64 {
    10.0
}

fn default_settle_s() -> f64 {
    0.2
}

fn default_next_track_settle_s() -> f64 {
    0.1
}

/// `[reflash]` section: sound flash programming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflashConfig {
    /// ALSA device used to stream tracks to the robot.
    #[serde(default = "default_playback_device")]
    pub playback_device: String,
    /// Wait after the erase command, in seconds.
    #[serde(default = "default_erase_wait_s")]
    pub erase_wait_s: f64,
    /// Wait after a store command, in seconds.
    #[serde(default = "default_settle_s")]
    pub store_settle_s: f64,
    /// Wait after a confirm command, in seconds.
    #[serde(default = "default_settle_s")]
    pub confirm_settle_s: f64,
    /// Wait before the next track, in seconds.
    #[serde(default = "default_next_track_settle_s")]
    pub next_track_settle_s: f64,
}

impl Default for ReflashConfig {
    fn default() -> Self {
        Self {
            playback_device: default_playback_device(),
            erase_wait_s: default_erase_wait_s(),
            store_settle_s: default_settle_s(),
            confirm_settle_s: default_settle_s(),
            next_track_settle_s: default_next_track_settle_s(),
        }
    }
}

/// Driver configuration loaded from `driver.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Common settings.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Transport settings.
    #[serde(default)]
    pub usb: UsbConfig,
    /// Battery classification.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Sound flash programming.
    #[serde(default)]
    pub reflash: ReflashConfig,
    /// Link anomaly detection.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl DriverConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - `read_interval_ms` is zero
    /// - battery cutoffs are not strictly descending
    /// - a reflash delay is negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.usb.read_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "usb.read_interval_ms must be > 0".to_string(),
            ));
        }

        let b = &self.battery;
        if !(b.full_mv > b.high_mv && b.high_mv > b.low_mv) {
            return Err(ConfigError::ValidationError(format!(
                "battery cutoffs must descend: full {} > high {} > low {}",
                b.full_mv, b.high_mv, b.low_mv
            )));
        }

        let r = &self.reflash;
        for (name, value) in [
            ("erase_wait_s", r.erase_wait_s),
            ("store_settle_s", r.store_settle_s),
            ("confirm_settle_s", r.confirm_settle_s),
            ("next_track_settle_s", r.next_track_settle_s),
        ] {
            if value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "reflash.{name} cannot be negative ({value})"
                )));
            }
        }
        Ok(())
    }
}

/// Reads a TOML document from disk into any deserializable config type.
///
/// Implemented for every `DeserializeOwned` type, so `DriverConfig::load`
/// and the per-section structs share one loader. A missing file maps to
/// [`ConfigError::FileNotFound`], which the driver binary treats as "run
/// with defaults". Read and syntax errors both map to
/// [`ConfigError::ParseError`]. Semantic checks are left to `validate()`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Read and deserialize `path`.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// `DriverConfig` and each of its sections load through this.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_maps_onto_tracing() {
        let doc = "[shared]\nlog_level = \"warn\"\nservice_name = \"tux\"";
        let config: DriverConfig = toml::from_str(doc).unwrap();
        assert_eq!(
            tracing::Level::from(config.shared.log_level),
            tracing::Level::WARN
        );
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        let parsed: TestWrapper = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Debug);
        let parsed: TestWrapper = toml::from_str("level = \"error\"").unwrap();
        assert_eq!(parsed.level, LogLevel::Error);
        assert!(toml::from_str::<TestWrapper>("level = \"loud\"").is_err());
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config: DriverConfig = toml::from_str("").unwrap();
        assert_eq!(config.shared.service_name, DRIVER_SERVICE_NAME);
        assert_eq!(config.usb.vendor_id, 0x03EB);
        assert_eq!(config.usb.product_id, 0xFF07);
        assert_eq!(config.usb.transport, "simulation");
        assert_eq!(config.usb.read_interval_ms, 100);
        assert_eq!(config.monitor.empty_frame_limit, 20);
        assert!(!config.monitor.check_frame_id);
        assert_eq!(config.battery.full_mv, 5000.0);
        assert_eq!(config.reflash.playback_device, "plughw:TuxDroid");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut config = DriverConfig::default();
        config.usb.read_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_unordered_cutoffs() {
        let mut config = DriverConfig::default();
        config.battery.high_mv = 5000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_delay() {
        let mut config = DriverConfig::default();
        config.reflash.store_settle_s = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("store_settle_s"));
    }
}
