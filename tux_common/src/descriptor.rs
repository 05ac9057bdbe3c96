//! Device descriptor types.
//!
//! The descriptor is acquired each time the radio link comes up: firmware
//! versions of the five CPUs plus the derived package, the sound flash
//! content and the connection identifier. It serializes to JSON for hosts.

use serde::Serialize;
use std::fmt::Write;

/// CPUs of the robot and the dongle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum CpuId {
    /// Robot core CPU.
    Tuxcore = 0,
    /// Robot audio CPU.
    Tuxaudio = 1,
    /// Robot RF CPU.
    TuxRf = 2,
    /// Dongle RF CPU.
    FuxRf = 3,
    /// Dongle USB CPU.
    FuxUsb = 4,
}

impl CpuId {
    /// All CPUs in identifier order.
    pub const ALL: [CpuId; 5] = [
        Self::Tuxcore,
        Self::Tuxaudio,
        Self::TuxRf,
        Self::FuxRf,
        Self::FuxUsb,
    ];

    /// Convert from the 3-bit CPU number. Returns `None` for unknown CPUs.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Tuxcore),
            1 => Some(Self::Tuxaudio),
            2 => Some(Self::TuxRf),
            3 => Some(Self::FuxRf),
            4 => Some(Self::FuxUsb),
            _ => None,
        }
    }

    /// Dense index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tuxcore => "Tuxcore",
            Self::Tuxaudio => "Tuxaudio",
            Self::TuxRf => "TuxRF",
            Self::FuxRf => "FuxRF",
            Self::FuxUsb => "FuxUSB",
        }
    }

    /// RF CPUs report no revision frame; their version string is final on VERSION.
    #[inline]
    pub const fn is_rf(self) -> bool {
        matches!(self, Self::TuxRf | Self::FuxRf)
    }
}

/// Version information of one CPU, or of the firmware package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirmwareDescriptor {
    /// CPU, `None` for the package.
    pub cpu: Option<CpuId>,
    /// Major version.
    pub version_major: u32,
    /// Minor version.
    pub version_minor: u32,
    /// Update version.
    pub version_update: u32,
    /// Source revision.
    pub revision: u32,
    /// Built as an official release.
    pub release: bool,
    /// Built from locally modified sources.
    pub local_modification: bool,
    /// Built from mixed revisions.
    pub mixed_revisions: bool,
    /// Author identifier.
    pub author: u32,
    /// Variation identifier.
    pub variation: u32,
    /// Human-readable version.
    pub version_string: String,
}

impl FirmwareDescriptor {
    /// Empty descriptor for `cpu`.
    pub fn for_cpu(cpu: CpuId) -> Self {
        Self {
            cpu: Some(cpu),
            ..Self::default()
        }
    }

    /// `(major, minor, update)` triple.
    #[inline]
    pub const fn triple(&self) -> (u32, u32, u32) {
        (self.version_major, self.version_minor, self.version_update)
    }

    /// Text dump of this descriptor.
    pub fn dump(&self, out: &mut String) {
        let (id, name) = match self.cpu {
            Some(cpu) => (cpu as i32, cpu.name()),
            None => (-1, "CPU_UNKNOWN"),
        };
        let yes_no = |flag: bool| if flag { "True" } else { "False" };
        let _ = write!(
            out,
            "    CPU id : \t\t\t{id}\n\
             \x20   CPU name : \t\t\t{name}\n\
             \x20   Version major : \t\t{}\n\
             \x20   Version minor : \t\t{}\n\
             \x20   Version update : \t\t{}\n\
             \x20   Revision : \t\t\t{}\n\
             \x20   Released : \t\t\t{}\n\
             \x20   Local modification : \t{}\n\
             \x20   Mixed revisions : \t\t{}\n\
             \x20   Author id : \t\t{}\n\
             \x20   Variation : \t\t{}\n\
             \x20   Symbolic version : \t\t[{}]\n",
            self.version_major,
            self.version_minor,
            self.version_update,
            self.revision,
            yes_no(self.release),
            yes_no(self.local_modification),
            yes_no(self.mixed_revisions),
            self.author,
            self.variation,
            self.version_string,
        );
    }
}

/// Firmware part of the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareSet {
    /// Aggregated package version.
    pub package: FirmwareDescriptor,
    /// Per-CPU versions, indexed by [`CpuId::index`].
    pub cpus: [FirmwareDescriptor; 5],
}

impl Default for FirmwareSet {
    fn default() -> Self {
        Self {
            package: FirmwareDescriptor::default(),
            cpus: CpuId::ALL.map(FirmwareDescriptor::for_cpu),
        }
    }
}

impl FirmwareSet {
    /// Descriptor of one CPU.
    #[inline]
    pub fn cpu(&self, cpu: CpuId) -> &FirmwareDescriptor {
        &self.cpus[cpu.index()]
    }

    /// Mutable descriptor of one CPU.
    #[inline]
    pub fn cpu_mut(&mut self, cpu: CpuId) -> &mut FirmwareDescriptor {
        &mut self.cpus[cpu.index()]
    }
}

/// Driver version part of the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverVersion {
    /// Major version.
    pub version_major: u32,
    /// Minor version.
    pub version_minor: u32,
    /// Update version.
    pub version_update: u32,
    /// Build number.
    pub version_build: u32,
    /// Release state.
    pub version_state: String,
    /// Complete version string.
    pub version_string: String,
}

impl DriverVersion {
    /// Version of this driver build.
    pub fn current(build: u32, state: &str) -> Self {
        let (major, minor, update) = crate::consts::DRIVER_VERSION;
        Self {
            version_major: major,
            version_minor: minor,
            version_update: update,
            version_build: build,
            version_state: state.to_string(),
            version_string: format!("libtuxdriver_{major}.{minor}.{update}-r{build}"),
        }
    }
}

/// Sound flash part of the descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SoundFlashDescriptor {
    /// Number of stored tracks.
    pub number_of_sounds: u32,
    /// Last used flash block.
    pub flash_usage: u32,
    /// Remaining record time in seconds.
    pub available_record_time: u32,
}

impl SoundFlashDescriptor {
    /// Text dump.
    pub fn dump(&self, out: &mut String) {
        let _ = write!(
            out,
            "- Sound flash\n    Number of sounds : {}\n    Last used block : {}\n    \
             Available record time (sec) : {}\n",
            self.number_of_sounds, self.flash_usage, self.available_record_time
        );
    }
}

/// Connection identifier part of the descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdDescriptor {
    /// Robot identifier.
    pub number: u32,
}

impl IdDescriptor {
    /// Text dump.
    pub fn dump(&self, out: &mut String) {
        let _ = write!(out, "- ID connection\n  - number : \t[{}]\n", self.number);
    }
}

/// Complete descriptor snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuxDescriptor {
    /// Firmware versions.
    pub firmwares: FirmwareSet,
    /// Driver version.
    pub driver: DriverVersion,
    /// Sound flash content.
    pub sound_flash: SoundFlashDescriptor,
    /// Connection identifier.
    pub id: IdDescriptor,
}

impl TuxDescriptor {
    /// Text dump of the whole descriptor.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("- Firmware package\n");
        self.firmwares.package.dump(&mut out);
        for cpu in CpuId::ALL {
            let _ = writeln!(out, "- Firmware {}", cpu.name());
            self.firmwares.cpu(cpu).dump(&mut out);
        }
        let _ = writeln!(out, "- Driver\n    Version : \t\t\t[{}]", self.driver.version_string);
        self.sound_flash.dump(&mut out);
        self.id.dump(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_ids_and_names() {
        for (i, cpu) in CpuId::ALL.iter().enumerate() {
            assert_eq!(cpu.index(), i);
            assert_eq!(CpuId::from_u8(i as u8), Some(*cpu));
        }
        assert_eq!(CpuId::from_u8(5), None);
        assert_eq!(CpuId::FuxUsb.name(), "FuxUSB");
        assert!(CpuId::TuxRf.is_rf() && CpuId::FuxRf.is_rf());
        assert!(!CpuId::Tuxcore.is_rf());
    }

    #[test]
    fn firmware_set_default_tags_cpus() {
        let set = FirmwareSet::default();
        assert_eq!(set.package.cpu, None);
        assert_eq!(set.cpu(CpuId::Tuxaudio).cpu, Some(CpuId::Tuxaudio));
    }

    #[test]
    fn driver_version_string() {
        let v = DriverVersion::current(42, "release");
        assert_eq!(v.version_string, "libtuxdriver_0.0.6-r42");
    }

    #[test]
    fn dumps_contain_fields() {
        let mut out = String::new();
        SoundFlashDescriptor {
            number_of_sounds: 3,
            flash_usage: 20,
            available_record_time: 54,
        }
        .dump(&mut out);
        assert!(out.starts_with("- Sound flash\n"));
        assert!(out.contains("Available record time (sec) : 54"));

        let mut out = String::new();
        IdDescriptor { number: 7 }.dump(&mut out);
        assert_eq!(out, "- ID connection\n  - number : \t[7]\n");

        let mut out = String::new();
        FirmwareDescriptor::for_cpu(CpuId::Tuxcore).dump(&mut out);
        assert!(out.contains("CPU name : \t\t\tTuxcore"));
        assert!(out.contains("Released : \t\t\tFalse"));
    }
}
