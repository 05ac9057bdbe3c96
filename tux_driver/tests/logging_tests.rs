//! Runtime logging control.
//!
//! Installs the process-wide subscriber, so it lives in its own test binary
//! with a single test.

use std::fs;
use tempfile::TempDir;
use tracing::{Level, debug, info, warn};
use tux_common::config::{DriverConfig, LogLevel};
use tux_driver::logging;
use tux_driver::{DriverError, LogFormat, LogTarget, LoggingError, TuxDriver};

#[test]
fn test_log_level_and_target_follow_the_driver() {
    let driver = TuxDriver::new(DriverConfig::default()).expect("driver");
    assert!(matches!(
        driver.set_log_level(LogLevel::Debug),
        Err(DriverError::Logging(LoggingError::NotInstalled))
    ));

    let dir = TempDir::new().expect("temp dir");
    let first = dir.path().join("first.log");
    let second = dir.path().join("second.log");

    logging::init(Level::WARN, LogFormat::Text, &LogTarget::File(first.clone()))
        .expect("install subscriber");
    assert!(matches!(
        logging::init(Level::WARN, LogFormat::Text, &LogTarget::Stdout),
        Err(LoggingError::AlreadyInstalled)
    ));

    info!("quiet-info-line");
    warn!("loud-warn-line");
    assert!(!tracing::enabled!(Level::INFO));

    driver.set_log_level(LogLevel::Debug).expect("set level");
    assert!(tracing::enabled!(Level::DEBUG));
    debug!("debug-after-raise");

    driver
        .set_log_target(&LogTarget::File(second.clone()))
        .expect("set target");
    warn!("line-in-second-file");

    let text = fs::read_to_string(&first).expect("first log");
    assert!(text.contains("loud-warn-line"));
    assert!(!text.contains("quiet-info-line"));
    assert!(text.contains("debug-after-raise"));
    assert!(!text.contains("line-in-second-file"));

    let text = fs::read_to_string(&second).expect("second log");
    assert!(text.contains("line-in-second-file"));

    let missing = LogTarget::File(dir.path().join("no-such-dir").join("x.log"));
    assert!(matches!(
        driver.set_log_target(&missing),
        Err(DriverError::Logging(LoggingError::File { .. }))
    ));
}
