//! # Tux Droid Driver Binary
//!
//! Runs the driver read loop against the USB dongle, logging every status
//! event until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Run against the simulated dongle
//! tux_driver --config /etc/tuxdroid/driver.toml --simulate
//!
//! # Run a macro file on every connection
//! tux_driver --transport hidraw --macro wake_up.txt
//!
//! # Print the status catalogue and exit
//! tux_driver --status-doc
//!
//! # Verbose logging, JSON output
//! tux_driver -s -v --json
//!
//! # Log to a file
//! tux_driver -s --log-file /var/log/tuxdriver.log
//! ```

#![deny(warnings)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tux_common::config::{ConfigError, ConfigLoader, DriverConfig};
use tux_common::consts::DEFAULT_CONFIG_PATH;
use tux_common::status::{StatusId, StatusValue};
use tux_driver::logging;
use tux_driver::{DriverContext, LogFormat, LogTarget, LoggingError, TuxDriver, status_doc};

/// Tux Droid driver - polls the USB dongle and publishes status events
#[derive(Parser, Debug)]
#[command(name = "tux_driver")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Host driver for the Tux Droid USB dongle")]
#[command(long_about = None)]
struct Args {
    /// Path to the driver configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force the simulated dongle (overrides --transport)
    #[arg(short = 's', long)]
    simulate: bool,

    /// Transport to use instead of the configured one
    #[arg(short, long)]
    transport: Option<String>,

    /// Macro file run on every dongle connection
    #[arg(short, long = "macro", value_name = "FILE")]
    macro_file: Option<PathBuf>,

    /// Print the status catalogue and exit
    #[arg(long)]
    status_doc: bool,

    /// Print the descriptor as JSON once it is complete
    #[arg(short, long)]
    descriptor: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Append logs to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Driver startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.status_doc {
        print!("{}", status_doc());
        return Ok(());
    }

    let mut config = load_config(&args)?;
    setup_tracing(&args, config.shared.log_level.into())?;

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if args.simulate {
        info!("Simulation mode enabled (exclusive)");
        config.usb.transport = "simulation".to_string();
    } else if let Some(ref transport) = args.transport {
        info!("Transport from CLI: {}", transport);
        config.usb.transport = transport.clone();
    }

    let driver = TuxDriver::new(config)?;
    install_callbacks(&driver, &args);

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    })?;

    driver.start()?;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    driver.stop()?;

    info!("Tux driver shutdown complete");
    Ok(())
}

/// Load the configuration file, falling back to defaults when it is missing.
fn load_config(args: &Args) -> Result<DriverConfig, ConfigError> {
    match DriverConfig::load(&args.config) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound) => {
            // Tracing is not up yet.
            eprintln!(
                "No configuration at {}, using defaults",
                args.config.display()
            );
            Ok(DriverConfig::default())
        }
        Err(e) => Err(e),
    }
}

fn install_callbacks(driver: &TuxDriver, args: &Args) {
    driver.set_status_callback(|line| info!("{}", line));
    driver.set_dongle_disconnected_callback(|| warn!("Dongle lost, waiting for reconnection"));

    let context: Weak<DriverContext> = Arc::downgrade(driver.context());
    let macro_file = args.macro_file.clone();
    driver.set_dongle_connected_callback(move || {
        let (Some(context), Some(path)) = (context.upgrade(), macro_file.as_ref()) else {
            return;
        };
        if let Err(e) = context.run_macro_file(path) {
            warn!("Macro {} failed: {}", path.display(), e);
        }
    });

    if args.descriptor {
        let context: Weak<DriverContext> = Arc::downgrade(driver.context());
        let printed = AtomicBool::new(false);
        driver.set_end_cycle_callback(move || {
            let Some(context) = context.upgrade() else {
                return;
            };
            let complete = context.status_value(StatusId::DescriptorComplete);
            if complete != StatusValue::Bool(true) {
                printed.store(false, Ordering::SeqCst);
                return;
            }
            if printed.swap(true, Ordering::SeqCst) {
                return;
            }
            match serde_json::to_string_pretty(&context.descriptor()) {
                Ok(text) => println!("{}", text),
                Err(e) => warn!("Descriptor serialization failed: {}", e),
            }
        });
    }
}

/// Setup tracing subscriber based on CLI arguments and configuration.
fn setup_tracing(args: &Args, configured: Level) -> Result<(), LoggingError> {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured
    };

    let format = if args.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };

    let target = match &args.log_file {
        Some(path) => LogTarget::File(path.clone()),
        None => LogTarget::Stdout,
    };

    logging::init(level, format, &target)
}
