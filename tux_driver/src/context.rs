//! Driver context.
//!
//! Single owner of every piece of runtime state: link, hardware snapshot,
//! status table, command stacks, callbacks and the per-subsystem trackers.
//! Each resource sits behind its own lock. Guards are held for short
//! sections only; no guard is held while a report is written or a callback
//! runs.
//!
//! Subsystem logic lives in [`crate::subsystems`], [`crate::executor`],
//! [`crate::firmware`] and [`crate::reflash`] as further `impl` blocks on
//! [`DriverContext`].

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::{debug, info, warn};
use tux_common::clock::Clock;
use tux_common::config::DriverConfig;
use tux_common::consts::COMMAND_STACK_CAPACITY;
use tux_common::descriptor::{DriverVersion, IdDescriptor, SoundFlashDescriptor, TuxDescriptor};
use tux_common::protocol::command::{Command, CommandCategory};
use tux_common::protocol::frame::{Frame, FrameHeader};
use tux_common::protocol::opcodes::WAKEUP_FRAME;
use tux_common::status::{StatusId, StatusValue};
use tux_common::transport::{SendReport, Transport};

use crate::callbacks::Callbacks;
use crate::firmware::FirmwareVersioning;
use crate::hw_status::{FrameUpdate, HwStatus};
use crate::link::{PollEvent, SendError, UsbLink};
use crate::reflash::{AudioPlayer, ReflashMachine};
use crate::scheduler::CommandStacks;
use crate::status_table::StatusTable;
use crate::subsystems::battery::BatteryMonitor;
use crate::subsystems::leds::LedFading;
use crate::subsystems::light::LightMonitor;
use crate::subsystems::pong::PongMonitor;
use crate::subsystems::user_inputs::RemoteControl;

/// Release state reported in the driver version.
const VERSION_STATE: &str = "release";

/// Shared driver state.
pub struct DriverContext {
    pub(crate) config: DriverConfig,
    clock: Arc<dyn Clock>,
    pub(crate) link: UsbLink,
    pub(crate) hw: Mutex<HwStatus>,
    pub(crate) status: Mutex<StatusTable>,
    pub(crate) stacks: Mutex<CommandStacks>,
    pub(crate) callbacks: Mutex<Callbacks>,
    pub(crate) firmware: Mutex<FirmwareVersioning>,
    pub(crate) reflash: Mutex<ReflashMachine>,
    pub(crate) remote: Mutex<RemoteControl>,
    pub(crate) battery: Mutex<BatteryMonitor>,
    pub(crate) light: Mutex<LightMonitor>,
    pub(crate) pong: Mutex<PongMonitor>,
    pub(crate) leds: Mutex<LedFading>,
    pub(crate) sound_flash: Mutex<SoundFlashDescriptor>,
    pub(crate) id: Mutex<IdDescriptor>,
    pub(crate) parser_enabled: AtomicBool,
    pub(crate) player: Box<dyn AudioPlayer>,
    ping_cycles: AtomicU32,
}

impl DriverContext {
    /// Context over `transport`, timed by `clock`.
    pub fn new(
        config: DriverConfig,
        transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
        player: Box<dyn AudioPlayer>,
    ) -> Self {
        let now = clock.now();
        let link = UsbLink::new(transport, &config.usb, &config.monitor);
        Self {
            link,
            hw: Mutex::new(HwStatus::new()),
            status: Mutex::new(StatusTable::new(now)),
            stacks: Mutex::new(CommandStacks::new()),
            callbacks: Mutex::new(Callbacks::default()),
            firmware: Mutex::new(FirmwareVersioning::new()),
            reflash: Mutex::new(ReflashMachine::new(config.reflash.clone())),
            remote: Mutex::new(RemoteControl::new()),
            battery: Mutex::new(BatteryMonitor::new(config.battery.clone())),
            light: Mutex::new(LightMonitor::new()),
            pong: Mutex::new(PongMonitor::new()),
            leds: Mutex::new(LedFading::default()),
            sound_flash: Mutex::new(SoundFlashDescriptor::default()),
            id: Mutex::new(IdDescriptor::default()),
            parser_enabled: AtomicBool::new(true),
            player,
            ping_cycles: AtomicU32::new(0),
            config,
            clock,
        }
    }

    /// Current time from the driver clock.
    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Driver configuration.
    #[inline]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Dongle link.
    #[inline]
    pub fn link(&self) -> &UsbLink {
        &self.link
    }

    /// Copy of the hardware snapshot.
    #[inline]
    pub fn hw_snapshot(&self) -> HwStatus {
        *self.hw.lock()
    }

    /// Current value of a status.
    pub fn status_value(&self, id: StatusId) -> StatusValue {
        self.status.lock().get(id).clone()
    }

    // ─── Status writes ──────────────────────────────────────────────

    /// Write a status with threshold-gated event.
    pub(crate) fn publish(&self, id: StatusId, value: StatusValue) {
        let now = self.now();
        let line = self.status.lock().set(id, value, now, true);
        if let Some(line) = line {
            self.fire_status(&line);
        }
    }

    /// Write a status without event.
    pub(crate) fn store(&self, id: StatusId, value: StatusValue) {
        let now = self.now();
        self.status.lock().set(id, value, now, false);
    }

    pub(crate) fn publish_bool(&self, id: StatusId, value: bool) {
        self.publish(id, StatusValue::Bool(value));
    }

    pub(crate) fn publish_u8(&self, id: StatusId, value: u8) {
        self.publish(id, StatusValue::Uint8(value));
    }

    pub(crate) fn publish_str(&self, id: StatusId, value: &str) {
        self.publish(id, StatusValue::Str(value.to_string()));
    }

    fn fire_status(&self, line: &str) {
        let callback = self.callbacks.lock().status.clone();
        if let Some(callback) = callback {
            callback(line);
        }
    }

    // ─── Outbound ───────────────────────────────────────────────────

    /// Write a frame routed to the robot. Returns whether it was written.
    pub(crate) fn send_to_tux(&self, frame: &Frame) -> bool {
        let result = self.link.send_to_tux(frame);
        self.handle_send(result)
    }

    /// Write a frame routed to the dongle. Returns whether it was written.
    pub(crate) fn send_to_dongle(&self, frame: &Frame) -> bool {
        let result = self.link.send_to_dongle(frame);
        self.handle_send(result)
    }

    /// Write a complete report. Returns whether it was written.
    pub(crate) fn send_raw(&self, report: &SendReport) -> bool {
        let result = self.link.send_raw(report);
        self.handle_send(result)
    }

    fn handle_send(&self, result: Result<(), SendError>) -> bool {
        match result {
            Ok(()) => true,
            Err(SendError::NotConnected) => false,
            Err(SendError::Lost(_)) => {
                self.on_disconnect();
                false
            }
        }
    }

    // ─── Command stacks ─────────────────────────────────────────────

    /// Schedule a driver-issued command.
    pub(crate) fn insert_sys(&self, delay: f32, command: Command) -> bool {
        let now = self.now();
        self.stacks
            .lock()
            .sys
            .insert(command, f64::from(delay), now)
            .is_ok()
    }

    /// Drop system commands of `category` whose user command is gone.
    pub(crate) fn clean_sys(&self, category: CommandCategory) {
        self.stacks.lock().clean_sys(category);
    }

    /// Execute every pending system command, then clear both stacks.
    pub fn clear_delayed_commands(&self) {
        let pending = self.stacks.lock().drain_for_clear();
        for command in &pending {
            self.execute(command);
        }
    }

    /// Run due user commands, then due system commands, one slot at a
    /// time with the lock released around each execution. A user `OFF` due
    /// in this cycle drops its system stops before the system pass.
    fn sweep_stacks(&self) {
        let now = self.now();
        for index in 0..COMMAND_STACK_CAPACITY {
            let user = self.stacks.lock().user.take_expired_at(index, now);
            if let Some(command) = user {
                self.run_delayed(&command);
            }
        }
        for index in 0..COMMAND_STACK_CAPACITY {
            let sys = self.stacks.lock().sys.take_expired_at(index, now);
            if let Some(command) = sys {
                self.run_delayed(&command);
            }
        }
    }

    fn run_delayed(&self, command: &Command) {
        debug!("Execute delayed command : [{}]", command);
        self.execute(command);
    }

    // ─── Inbound ────────────────────────────────────────────────────

    /// Dispatch one status frame.
    pub fn on_frame(&self, frame: &Frame) {
        let update = self.hw.lock().update(frame);
        let (header, changed) = match update {
            FrameUpdate::Changed(header) => (header, true),
            FrameUpdate::Unchanged(header) => (header, false),
            FrameUpdate::Unknown(_) => {
                warn!(
                    "STATUS FRAME : {:02x} {:02x} {:02x} {:02x}",
                    frame[0], frame[1], frame[2], frame[3]
                );
                return;
            }
        };
        let hw = self.hw_snapshot();

        match header {
            FrameHeader::Version => self.firmware.lock().update_version(hw.version()),
            FrameHeader::Revision => self.firmware.lock().update_revision(hw.revision()),
            FrameHeader::Author => self.firmware.lock().update_author(hw.author()),
            FrameHeader::SoundVar => self.update_sound_flash(&hw),
            FrameHeader::Id => self.update_id(&hw),
            FrameHeader::Ir => self.remote.lock().mark_received(),
            FrameHeader::Audio => self.update_flash_play(&hw),
            FrameHeader::Pong => self.update_pong(&hw),
            FrameHeader::Battery => {
                self.update_charger_state(&hw);
                if changed {
                    self.update_battery_level(&hw);
                }
            }
            _ if !changed => {}
            FrameHeader::Ports => {
                self.update_mouth_position(&hw);
                self.update_eyes_position(&hw);
            }
            FrameHeader::Position1 => {
                self.update_flippers_remaining(&hw);
                self.update_mouth_remaining(&hw);
                self.update_eyes_remaining(&hw);
            }
            FrameHeader::Position2 => {
                self.update_flippers_position(&hw);
                self.update_spinning_direction(&hw);
                self.update_spinning_remaining(&hw);
                self.update_eyes_motor(&hw);
                self.update_mouth_motor(&hw);
                self.update_flippers_motor(&hw);
                self.update_spin_motors(&hw);
            }
            FrameHeader::Sensors1 => {
                self.update_general_play(&hw);
                self.update_buttons(&hw);
            }
            FrameHeader::Light => self.update_light_level_from(&hw),
            FrameHeader::Led => self.update_leds(&hw),
            FrameHeader::FlashProg => self.update_flash_programming(&hw),
        }
    }

    // ─── Connection lifecycle ───────────────────────────────────────

    /// The dongle was captured.
    pub fn on_connect(&self) {
        info!("Dongle connected via '{}'", self.link.transport_name());
        let now = self.now();
        self.reset_descriptors();
        self.hw.lock().reset();
        self.status.lock().reset(now);
        self.remote.lock().reset();
        *self.stacks.lock() = CommandStacks::new();
        self.publish_bool(StatusId::DonglePlug, true);
        self.send_to_tux(&WAKEUP_FRAME);
        let callback = self.callbacks.lock().connected.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// The dongle was lost.
    pub fn on_disconnect(&self) {
        info!("Dongle disconnected");
        self.publish_bool(StatusId::RadioState, false);
        self.publish_bool(StatusId::DonglePlug, false);
        let callback = self.callbacks.lock().disconnected.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// The radio link with the robot changed.
    pub fn on_rf_change(&self, online: bool) {
        info!("Radio link {}", if online { "up" } else { "down" });
        self.link.set_rf_online(online);
        self.publish_bool(StatusId::RadioState, online);
        if online {
            self.acquire_descriptor();
            self.remote.lock().reset();
            self.reset_positions();
        }
    }

    fn reset_descriptors(&self) {
        self.firmware.lock().reset();
        *self.sound_flash.lock() = SoundFlashDescriptor::default();
        *self.id.lock() = IdDescriptor::default();
    }

    /// Start descriptor acquisition: connection id and firmware versions.
    pub(crate) fn acquire_descriptor(&self) {
        self.store(StatusId::DescriptorComplete, StatusValue::Bool(false));
        self.request_id();
        self.firmware.lock().start();
    }

    /// Snapshot of the descriptor.
    pub fn descriptor(&self) -> TuxDescriptor {
        let firmwares = self.firmware.lock().firmwares().clone();
        let build = env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0);
        TuxDescriptor {
            firmwares,
            driver: DriverVersion::current(build, VERSION_STATE),
            sound_flash: *self.sound_flash.lock(),
            id: *self.id.lock(),
        }
    }

    // ─── Cycle ──────────────────────────────────────────────────────

    /// End-of-cycle processing, in order: remote control, ping, firmware
    /// versioning, reflash, frame counters, delayed commands, host callback.
    pub fn end_cycle(&self) {
        self.update_remote();
        if self.config.monitor.connection_quality {
            let cycles = self.ping_cycles.fetch_add(1, Ordering::SeqCst) + 1;
            if cycles >= crate::subsystems::pong::PING_PERIOD_CYCLES {
                self.ping_cycles.store(0, Ordering::SeqCst);
                self.send_ping();
            }
        }
        self.firmware_tick();
        self.reflash_tick();
        if let Some(dump) = self.hw.lock().check_counters() {
            debug!("{}", dump);
        }
        self.sweep_stacks();
        let callback = self.callbacks.lock().end_cycle.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// One polling exchange followed by frame dispatch and end of cycle.
    ///
    /// Returns `false` when the link is down.
    pub fn read_cycle(&self) -> bool {
        match self.link.poll() {
            PollEvent::NotConnected => false,
            PollEvent::Lost => {
                self.on_disconnect();
                false
            }
            PollEvent::Report(action) => {
                if let Some(online) = action.rf_change {
                    self.on_rf_change(online);
                }
                for frame in &action.frames {
                    self.on_frame(frame);
                }
                self.end_cycle();
                true
            }
        }
    }
}

impl std::fmt::Debug for DriverContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverContext")
            .field("transport", &self.link.transport_name())
            .field("connected", &self.link.is_connected())
            .field("rf_online", &self.link.rf_online())
            .field("parser_enabled", &self.parser_enabled.load(Ordering::SeqCst))
            .finish()
    }
}
