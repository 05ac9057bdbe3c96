//! Public driver handle.
//!
//! [`TuxDriver`] is what host applications hold. It owns the shared
//! [`DriverContext`] and the [`TuxCore`] polling loop, which runs either on
//! a background thread ([`start`](TuxDriver::start)) or one step at a time
//! ([`step`](TuxDriver::step)).
//!
//! Every operation is callable from any thread while the loop runs.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{info, warn};
use tux_common::clock::{Clock, SystemClock};
use tux_common::config::{ConfigError, DriverConfig, LogLevel};
use tux_common::descriptor::TuxDescriptor;
use tux_common::error::TuxResult;
use tux_common::transport::{Transport, TransportError};

use crate::callbacks::{SimpleCallback, StatusCallback};
use crate::context::DriverContext;
use crate::core::{StepOutcome, TuxCore};
use crate::logging::{self, LogTarget, LoggingError};
use crate::parser::tokenize;
use crate::reflash::{AplayPlayer, AudioPlayer};
use crate::status_table::{status_id, status_id_by_name};
use crate::transport_registry::TransportRegistry;

/// Text value of an unknown status.
pub const NULL_VALUE: &str = "NULL";

/// Errors raised while building or running the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport creation failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Log subscriber not installed or not reconfigurable.
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// The read loop already runs on its thread.
    #[error("Driver already started")]
    AlreadyStarted,

    /// The read loop thread could not be spawned or joined.
    #[error("Read loop thread error: {0}")]
    Thread(String),
}

struct Worker {
    running: Arc<AtomicBool>,
    handle: JoinHandle<TuxCore>,
}

/// Handle on a driver instance.
pub struct TuxDriver {
    context: Arc<DriverContext>,
    core: Mutex<Option<TuxCore>>,
    worker: Mutex<Option<Worker>>,
}

impl TuxDriver {
    /// Build a driver from configuration: transport from the registry,
    /// wall clock and `aplay` playback.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or its transport is not
    /// registered.
    pub fn new(config: DriverConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let transport = TransportRegistry::with_builtin().create_transport(&config.usb.transport)?;
        info!(
            "Created transport: {} v{}",
            transport.name(),
            transport.version()
        );
        let player = AplayPlayer::new(config.reflash.playback_device.clone());
        Ok(Self::with_parts(
            config,
            transport,
            Arc::new(SystemClock),
            Box::new(player),
        ))
    }

    /// Build a driver from explicit parts.
    pub fn with_parts(
        config: DriverConfig,
        transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
        player: Box<dyn AudioPlayer>,
    ) -> Self {
        let context = Arc::new(DriverContext::new(config, transport, clock, player));
        let core = TuxCore::new(Arc::clone(&context));
        Self {
            context,
            core: Mutex::new(Some(core)),
            worker: Mutex::new(None),
        }
    }

    /// Shared driver context.
    pub fn context(&self) -> &Arc<DriverContext> {
        &self.context
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Run the read loop on a background thread.
    ///
    /// # Errors
    /// [`DriverError::AlreadyStarted`] when the loop already runs.
    pub fn start(&self) -> Result<(), DriverError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(DriverError::AlreadyStarted);
        }
        let mut core = self.core.lock().take().ok_or(DriverError::AlreadyStarted)?;
        let running = core.running_flag();
        running.store(true, Ordering::SeqCst);
        let spawned = std::thread::Builder::new()
            .name("tux-read-loop".to_string())
            .spawn(move || {
                core.run();
                core
            });
        match spawned {
            Ok(handle) => {
                *worker = Some(Worker { running, handle });
                Ok(())
            }
            Err(e) => Err(DriverError::Thread(e.to_string())),
        }
    }

    /// Stop the read loop and release the dongle.
    ///
    /// # Errors
    /// [`DriverError::Thread`] when the loop thread panicked.
    pub fn stop(&self) -> Result<(), DriverError> {
        let Some(worker) = self.worker.lock().take() else {
            if let Some(core) = self.core.lock().as_mut() {
                core.shutdown();
            }
            return Ok(());
        };
        worker.running.store(false, Ordering::SeqCst);
        let mut core = worker
            .handle
            .join()
            .map_err(|_| DriverError::Thread("read loop panicked".to_string()))?;
        core.shutdown();
        *self.core.lock() = Some(core);
        Ok(())
    }

    /// Run one step of the read loop on the calling thread.
    ///
    /// # Errors
    /// [`DriverError::AlreadyStarted`] while the loop runs on its thread.
    pub fn step(&self) -> Result<StepOutcome, DriverError> {
        let mut core = self.core.lock();
        let core = core.as_mut().ok_or(DriverError::AlreadyStarted)?;
        Ok(core.step())
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Execute a text command now, or after `delay` seconds.
    pub fn perform_command(&self, delay: f32, text: &str) -> TuxResult<()> {
        self.context.perform_command(delay, text)
    }

    /// Execute pending driver commands, then drop every delayed command.
    pub fn clear_all(&self) {
        self.context.clear_delayed_commands();
    }

    /// Run a macro given as text.
    pub fn perform_macro(&self, text: &str) -> TuxResult<()> {
        self.context.run_macro(text)
    }

    /// Run a macro file.
    pub fn perform_macro_file(&self, path: &Path) -> TuxResult<()> {
        self.context.run_macro_file(path)
    }

    /// Replace the sound bank with a `|`-separated list of WAV files.
    pub fn sound_reflash(&self, tracks: &str) -> TuxResult<()> {
        self.context.start_reflash(tracks)
    }

    /// Bring the body back to its rest position.
    pub fn reset_positions(&self) {
        self.context.reset_positions();
    }

    /// Reset the dongle. Returns whether the reset was written.
    pub fn reset_dongle(&self) -> bool {
        self.context.link().reset_dongle().is_ok()
    }

    /// Stop the eyes.
    pub fn eyes_off(&self) -> bool {
        self.context.eyes_off()
    }

    /// Stop the mouth.
    pub fn mouth_off(&self) -> bool {
        self.context.mouth_off()
    }

    /// Stop the flippers.
    pub fn flippers_off(&self) -> bool {
        self.context.flippers_off()
    }

    /// Stop spinning.
    pub fn spinning_off(&self) -> bool {
        self.context.spinning_off()
    }

    /// Re-evaluate the light level from the last LIGHT frame.
    pub fn update_light_level(&self) {
        self.context.update_light_level();
    }

    // ─── Status ─────────────────────────────────────────────────────

    /// Name of a status.
    pub fn get_status_name(&self, id: i32) -> TuxResult<&'static str> {
        Ok(status_id(id)?.name())
    }

    /// Identifier of a status.
    pub fn get_status_id(&self, name: &str) -> TuxResult<i32> {
        Ok(status_id_by_name(name)?.index() as i32)
    }

    /// State line `name:type:value:age` of a status.
    pub fn get_status_state(&self, id: i32) -> TuxResult<String> {
        let id = status_id(id)?;
        let now = self.context.now();
        Ok(self.context.status.lock().state_line(id, now))
    }

    /// State lines of every status, newline-terminated.
    pub fn get_all_status_state(&self) -> String {
        let now = self.context.now();
        self.context.status.lock().all_states(now)
    }

    /// Text value of a status.
    ///
    /// # Errors
    /// [`TuxError::InvalidIdentifier`](tux_common::error::TuxError) for an
    /// unknown id, whose text value is [`NULL_VALUE`].
    pub fn get_status_value(&self, id: i32) -> TuxResult<String> {
        let id = status_id(id)?;
        Ok(self.context.status.lock().get(id).to_string())
    }

    /// Split a state line with the command tokenizer.
    pub fn tokenize_status(text: &str) -> Vec<String> {
        tokenize(text).iter().map(|s| s.to_string()).collect()
    }

    /// Message of an error code.
    pub fn strerror(code: i32) -> String {
        tux_common::error::strerror(code)
    }

    /// Snapshot of the descriptor.
    pub fn get_descriptor(&self) -> TuxDescriptor {
        self.context.descriptor()
    }

    // ─── Logging ────────────────────────────────────────────────────

    /// Change log verbosity while the driver runs.
    ///
    /// # Errors
    /// [`DriverError::Logging`] when no subscriber was installed through
    /// [`logging::init`].
    pub fn set_log_level(&self, level: LogLevel) -> Result<(), DriverError> {
        logging::set_level(level)?;
        info!("Log level set to {:?}", level);
        Ok(())
    }

    /// Redirect log output.
    ///
    /// # Errors
    /// [`DriverError::Logging`] when no subscriber was installed or the log
    /// file cannot be opened.
    pub fn set_log_target(&self, target: &LogTarget) -> Result<(), DriverError> {
        logging::set_target(target)?;
        info!("Log target set to {:?}", target);
        Ok(())
    }

    // ─── Callbacks ──────────────────────────────────────────────────

    /// Called with a state line on every status event.
    pub fn set_status_callback(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        let callback: StatusCallback = Arc::new(callback);
        self.context.callbacks.lock().status = Some(callback);
    }

    /// Called at the end of every polling cycle.
    pub fn set_end_cycle_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        let callback: SimpleCallback = Arc::new(callback);
        self.context.callbacks.lock().end_cycle = Some(callback);
    }

    /// Called when the dongle is captured.
    pub fn set_dongle_connected_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        let callback: SimpleCallback = Arc::new(callback);
        self.context.callbacks.lock().connected = Some(callback);
    }

    /// Called when the dongle is lost.
    pub fn set_dongle_disconnected_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        let callback: SimpleCallback = Arc::new(callback);
        self.context.callbacks.lock().disconnected = Some(callback);
    }
}

impl Drop for TuxDriver {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Driver stop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for TuxDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuxDriver")
            .field("context", &self.context)
            .field("started", &self.worker.lock().is_some())
            .finish()
    }
}
