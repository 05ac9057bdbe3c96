//! Firmware versioning.
//!
//! When the radio link comes up the driver queries the version, revision
//! and author of the five CPUs, one at a time, then derives the firmware
//! package and publishes the symbolic versions.
//!
//! # State machine
//!
//! ```text
//! STANDBY ──start──▶ INIT ──▶ INFO_REQ ◀──▶ INFO_GET
//!                     ▲           │ all CPUs done
//!                     │ retry     ▼
//!                     └──────── SPECIAL ──▶ RELEASE ──▶ FINALIZE ──▶ STANDBY
//! ```
//!
//! The machine advances one state per tick. Sending a request is the only
//! side effect; it is returned as an action and its outcome reported back
//! through [`FirmwareVersioning::complete`].

use tracing::{debug, info};
use tux_common::descriptor::{CpuId, FirmwareDescriptor, FirmwareSet};
use tux_common::protocol::registers::ReleaseType;
use tux_common::status::{StatusId, StatusValue};

use crate::context::DriverContext;
use crate::hw_status::{AuthorBody, RevisionBody, VersionBody};

/// Request attempts per CPU.
pub const CPU_RETRIES: u8 = 4;

/// Full acquisition restarts when a CPU stays silent.
pub const GLOBAL_RETRIES: u8 = 4;

/// Package string when the firmware set is no official release.
pub const UNOFFICIAL_PACKAGE: &str = "Unofficial package";

/// Symbolic version statuses, in publication order.
const PUBLISHED: [(StatusId, CpuId); 5] = [
    (StatusId::TuxcoreSymbolicVersion, CpuId::Tuxcore),
    (StatusId::TuxaudioSymbolicVersion, CpuId::Tuxaudio),
    (StatusId::FuxusbSymbolicVersion, CpuId::FuxUsb),
    (StatusId::FuxrfSymbolicVersion, CpuId::FuxRf),
    (StatusId::TuxrfSymbolicVersion, CpuId::TuxRf),
];

/// CPUs whose version is mandatory for a complete acquisition.
const MANDATORY: [CpuId; 4] = [CpuId::Tuxcore, CpuId::Tuxaudio, CpuId::TuxRf, CpuId::FuxRf];

/// Mixed firmware sets accepted as an official package: the package
/// triple and the version each listed CPU must run.
const MIXED_PACKAGES: [((u32, u32, u32), [(CpuId, (u32, u32, u32)); 3]); 1] = [(
    (0, 3, 1),
    [
        (CpuId::Tuxcore, (0, 3, 1)),
        (CpuId::Tuxaudio, (0, 3, 1)),
        (CpuId::FuxUsb, (0, 3, 0)),
    ],
)];

/// Versioning state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningState {
    /// Idle.
    Standby,
    /// Reset descriptors and start from the first CPU.
    Init,
    /// Request the version of the current CPU.
    InfoReq,
    /// Wait for the answer.
    InfoGet,
    /// Check that every mandatory CPU answered.
    Special,
    /// Derive the package.
    Release,
    /// Publish the versions.
    Finalize,
}

/// Side effect requested by one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersioningAction {
    /// Nothing to do.
    None,
    /// Send a versioning request for a CPU, then call `complete`.
    Request(CpuId),
    /// Publish the symbolic versions and mark the descriptor complete.
    Publish(Vec<(StatusId, String)>),
}

/// Firmware versioning machine and the firmware part of the descriptor.
#[derive(Debug, Clone)]
pub struct FirmwareVersioning {
    state: VersioningState,
    firmwares: FirmwareSet,
    current_cpu: Option<CpuId>,
    cpu: u8,
    retries: u8,
    global_retries: u8,
}

impl Default for FirmwareVersioning {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame carrying a versioning request for `cpu`.
pub fn request_frame(cpu: CpuId) -> [u8; 4] {
    [cpu as u8 + 2, 0, 0, 0]
}

fn version_string(desc: &FirmwareDescriptor, cpu: CpuId) -> String {
    let mut s = format!(
        "{}_{}.{}.{}",
        cpu.name(),
        desc.version_major,
        desc.version_minor,
        desc.version_update
    );
    if !desc.release {
        s.push_str(&format!(" - r{} (SVN/UNRELEASED)", desc.revision));
    }
    if desc.local_modification {
        s.push_str("(modified locally)");
    }
    if desc.mixed_revisions {
        s.push_str("(mixed revisions)");
    }
    s
}

/// Derive the package descriptor from the per-CPU versions.
///
/// The package is a release when every CPU is released and runs the same
/// version, the first RF revision (0.3.0 on both RF CPUs) being exempt, or
/// when the set matches a known mixed package.
pub fn determine_package(firmwares: &FirmwareSet) -> FirmwareDescriptor {
    let mut package = FirmwareDescriptor {
        version_string: UNOFFICIAL_PACKAGE.to_string(),
        ..FirmwareDescriptor::default()
    };
    let first = firmwares.cpu(CpuId::Tuxcore).triple();
    let first_rf = firmwares.cpu(CpuId::FuxRf).triple() == (0, 3, 0)
        && firmwares.cpu(CpuId::TuxRf).triple() == (0, 3, 0);

    let mut perfect = true;
    for cpu in CpuId::ALL {
        if first_rf && cpu.is_rf() {
            continue;
        }
        let desc = firmwares.cpu(cpu);
        if !desc.release {
            return package;
        }
        if desc.triple() != first {
            perfect = false;
        }
    }

    let triple = if perfect {
        first
    } else {
        let major = firmwares.cpus.iter().map(|d| d.version_major).max().unwrap_or(0);
        let minor = firmwares
            .cpus
            .iter()
            .filter(|d| d.version_major == major)
            .map(|d| d.version_minor)
            .max()
            .unwrap_or(0);
        let update = firmwares
            .cpus
            .iter()
            .filter(|d| d.version_major == major && d.version_minor == minor)
            .map(|d| d.version_update)
            .max()
            .unwrap_or(0);
        let triple = (major, minor, update);
        let known = MIXED_PACKAGES.iter().any(|(package, cpus)| {
            *package == triple && cpus.iter().all(|(cpu, v)| firmwares.cpu(*cpu).triple() == *v)
        });
        if !known {
            return package;
        }
        triple
    };

    let core = firmwares.cpu(CpuId::Tuxcore);
    package.version_major = triple.0;
    package.version_minor = triple.1;
    package.version_update = triple.2;
    package.release = true;
    package.author = core.author;
    package.variation = core.variation;
    package.version_string = format!(
        "tuxdroid firmware release {}.{}.{}",
        triple.0, triple.1, triple.2
    );
    package
}

impl FirmwareVersioning {
    /// Idle machine with empty descriptors.
    pub fn new() -> Self {
        Self {
            state: VersioningState::Standby,
            firmwares: FirmwareSet::default(),
            current_cpu: None,
            cpu: 0,
            retries: CPU_RETRIES,
            global_retries: GLOBAL_RETRIES,
        }
    }

    /// Current state.
    pub fn state(&self) -> VersioningState {
        self.state
    }

    /// Firmware part of the descriptor.
    pub fn firmwares(&self) -> &FirmwareSet {
        &self.firmwares
    }

    /// Back to standby with empty descriptors.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Start an acquisition. Ignored unless in standby.
    pub fn start(&mut self) -> bool {
        if self.state != VersioningState::Standby {
            return false;
        }
        self.reset();
        self.state = VersioningState::Init;
        true
    }

    fn clear_descriptors(&mut self) {
        self.firmwares = FirmwareSet::default();
        self.current_cpu = None;
    }

    fn queried(&self) -> Option<CpuId> {
        CpuId::from_u8(self.cpu)
    }

    fn next_cpu(&mut self) {
        self.cpu += 1;
        self.retries = CPU_RETRIES;
        self.state = VersioningState::InfoReq;
    }

    /// Advance one state.
    pub fn tick(&mut self) -> VersioningAction {
        match self.state {
            VersioningState::Standby => {}
            VersioningState::Init => {
                self.clear_descriptors();
                self.cpu = 0;
                self.retries = CPU_RETRIES;
                self.state = VersioningState::InfoReq;
            }
            VersioningState::InfoReq => {
                let Some(cpu) = self.queried() else {
                    self.state = VersioningState::Special;
                    return VersioningAction::None;
                };
                if self.firmwares.cpu(cpu).version_string.is_empty() {
                    if self.retries == 0 {
                        self.next_cpu();
                        return VersioningAction::None;
                    }
                    return VersioningAction::Request(cpu);
                }
                self.retries = CPU_RETRIES;
                self.state = VersioningState::InfoGet;
            }
            VersioningState::InfoGet => {
                let answered = self
                    .queried()
                    .is_some_and(|cpu| !self.firmwares.cpu(cpu).version_string.is_empty());
                if self.retries == 0 || answered {
                    self.next_cpu();
                } else {
                    self.retries -= 1;
                }
            }
            VersioningState::Special => {
                let missing = MANDATORY
                    .iter()
                    .any(|cpu| self.firmwares.cpu(*cpu).version_string.is_empty());
                if missing && self.global_retries > 0 {
                    self.global_retries -= 1;
                    debug!("Firmware versioning incomplete, {} retries left", self.global_retries);
                    self.state = VersioningState::Init;
                } else {
                    self.state = VersioningState::Release;
                }
            }
            VersioningState::Release => {
                self.firmwares.package = determine_package(&self.firmwares);
                info!("{}", self.firmwares.package.version_string);
                self.state = VersioningState::Finalize;
            }
            VersioningState::Finalize => {
                self.state = VersioningState::Standby;
                let versions = PUBLISHED
                    .iter()
                    .map(|(id, cpu)| (*id, self.firmwares.cpu(*cpu).version_string.clone()))
                    .collect();
                return VersioningAction::Publish(versions);
            }
        }
        VersioningAction::None
    }

    /// Outcome of a request returned by [`tick`](Self::tick).
    pub fn complete(&mut self, sent: bool) {
        if self.state != VersioningState::InfoReq {
            return;
        }
        if sent {
            self.retries = CPU_RETRIES;
            self.state = VersioningState::InfoGet;
        } else {
            self.retries = self.retries.saturating_sub(1);
        }
    }

    /// VERSION frame.
    pub fn update_version(&mut self, body: VersionBody) {
        let Some(cpu) = CpuId::from_u8(body.cm.cpu_number) else {
            return;
        };
        self.current_cpu = Some(cpu);
        let desc = self.firmwares.cpu_mut(cpu);
        desc.cpu = Some(cpu);
        desc.version_major = u32::from(body.cm.major);
        desc.version_minor = u32::from(body.minor);
        desc.version_update = u32::from(body.update);
        if cpu.is_rf() {
            desc.version_string = format!(
                "{}_{}.{}.{}",
                cpu.name(),
                desc.version_major,
                desc.version_minor,
                desc.version_update
            );
        }
    }

    /// REVISION frame, applied to the CPU of the last VERSION frame.
    pub fn update_revision(&mut self, body: RevisionBody) {
        let Some(cpu) = self.current_cpu else {
            return;
        };
        let desc = self.firmwares.cpu_mut(cpu);
        desc.revision = (u32::from(body.msb) << 8) + u32::from(body.lsb);
        desc.release = body.release_type.contains(ReleaseType::ORIGINAL_RELEASE);
        desc.local_modification = body.release_type.contains(ReleaseType::LOCAL_MODIFICATION);
        desc.mixed_revisions = body.release_type.contains(ReleaseType::MIXED_UPDATE);
        if desc.local_modification || desc.mixed_revisions {
            desc.release = false;
        }
        desc.version_string = version_string(desc, cpu);
    }

    /// AUTHOR frame, applied to the CPU of the last VERSION frame.
    pub fn update_author(&mut self, body: AuthorBody) {
        let Some(cpu) = self.current_cpu else {
            return;
        };
        let desc = self.firmwares.cpu_mut(cpu);
        desc.author = (u32::from(body.msb) << 8) + u32::from(body.lsb);
        desc.variation = u32::from(body.variation);
    }
}

impl DriverContext {
    pub(crate) fn firmware_tick(&self) {
        if !self.link.is_connected() {
            return;
        }
        let action = self.firmware.lock().tick();
        match action {
            VersioningAction::None => {}
            VersioningAction::Request(cpu) => {
                debug!("Send firmware versioning request ({})", cpu.name());
                let frame = request_frame(cpu);
                let sent = if cpu == CpuId::FuxUsb {
                    self.send_to_dongle(&frame)
                } else {
                    self.send_to_tux(&frame)
                };
                self.firmware.lock().complete(sent);
            }
            VersioningAction::Publish(versions) => {
                for (id, version) in versions {
                    self.publish(id, StatusValue::Str(version));
                }
                self.store(StatusId::DescriptorComplete, StatusValue::Bool(true));
            }
        }
    }
}
