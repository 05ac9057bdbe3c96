//! Status catalogue.
//!
//! Every software-visible property of the robot is a named, typed status
//! with a stable numeric identifier. The identifiers are a dense index into
//! [`CATALOGUE`]; the runtime table in the driver is built from it.

use std::fmt;

/// Number of catalogue entries.
pub const STATUS_COUNT: usize = 41;

/// Value type of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// `True` / `False`.
    Bool,
    /// Integer in `0..=255`.
    Uint8,
    /// Signed integer.
    Int,
    /// Floating point.
    Float,
    /// Free-form string.
    String,
}

impl StatusKind {
    /// Type name used in status lines.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Uint8 => "uint8",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

/// Current value of a status.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusValue {
    /// Boolean value.
    Bool(bool),
    /// Unsigned byte.
    Uint8(u8),
    /// Signed integer.
    Int(i32),
    /// Floating point.
    Float(f32),
    /// String.
    Str(String),
}

impl StatusValue {
    /// Value type.
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Bool(_) => StatusKind::Bool,
            Self::Uint8(_) => StatusKind::Uint8,
            Self::Int(_) => StatusKind::Int,
            Self::Float(_) => StatusKind::Float,
            Self::Str(_) => StatusKind::String,
        }
    }

    /// Integer view used by threshold comparisons.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Uint8(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Uint8(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.6}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// Initial value of a catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialValue {
    /// Boolean.
    Bool(bool),
    /// Unsigned byte.
    Uint8(u8),
    /// Signed integer.
    Int(i32),
    /// Floating point.
    Float(f32),
    /// Static string.
    Str(&'static str),
}

impl InitialValue {
    /// Owned runtime value.
    pub fn to_value(self) -> StatusValue {
        match self {
            Self::Bool(v) => StatusValue::Bool(v),
            Self::Uint8(v) => StatusValue::Uint8(v),
            Self::Int(v) => StatusValue::Int(v),
            Self::Float(v) => StatusValue::Float(v),
            Self::Str(v) => StatusValue::Str(v.to_string()),
        }
    }

    /// Value type.
    pub const fn kind(self) -> StatusKind {
        match self {
            Self::Bool(_) => StatusKind::Bool,
            Self::Uint8(_) => StatusKind::Uint8,
            Self::Int(_) => StatusKind::Int,
            Self::Float(_) => StatusKind::Float,
            Self::Str(_) => StatusKind::String,
        }
    }
}

/// Identifier of a status, dense in `0..STATUS_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum StatusId {
    FlippersPosition = 0,
    FlippersRemainingMovements,
    SpinningDirection,
    SpinningRemainingMovements,
    LeftWingButton,
    RightWingButton,
    HeadButton,
    RemoteButton,
    MouthPosition,
    MouthRemainingMovements,
    EyesPosition,
    EyesRemainingMovements,
    DescriptorComplete,
    RadioState,
    DonglePlug,
    ChargerState,
    BatteryLevel,
    BatteryState,
    LightLevel,
    LeftLedState,
    RightLedState,
    ConnectionQuality,
    AudioFlashPlay,
    AudioGeneralPlay,
    FlashProgrammingCurrentTrack,
    FlashProgrammingLastTrackSize,
    TuxcoreSymbolicVersion,
    TuxaudioSymbolicVersion,
    FuxusbSymbolicVersion,
    FuxrfSymbolicVersion,
    TuxrfSymbolicVersion,
    DriverSymbolicVersion,
    SoundReflashBegin,
    SoundReflashEnd,
    SoundReflashCurrentTrack,
    EyesMotorOn,
    MouthMotorOn,
    FlippersMotorOn,
    SpinLeftMotorOn,
    SpinRightMotorOn,
    SoundFlashCount,
}

impl StatusId {
    /// Dense index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from a raw identifier.
    pub fn from_index(index: usize) -> Option<Self> {
        CATALOGUE.get(index).map(|spec| spec.id)
    }

    /// Look up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        CATALOGUE.iter().find(|spec| spec.name == name).map(|spec| spec.id)
    }

    /// Catalogue entry.
    #[inline]
    pub fn spec(self) -> &'static StatusSpec {
        &CATALOGUE[self.index()]
    }

    /// Status name.
    #[inline]
    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

/// Static description of a status.
#[derive(Debug, Clone, Copy)]
pub struct StatusSpec {
    /// Identifier.
    pub id: StatusId,
    /// Unique name.
    pub name: &'static str,
    /// Possible values, for documentation.
    pub doc: &'static str,
    /// Value at driver start.
    pub initial: InitialValue,
    /// Event threshold. For numbers: minimal absolute change (floats are
    /// compared in thousandths). For strings: non-zero means "event on change".
    pub threshold: u32,
}

impl StatusSpec {
    /// Value type.
    #[inline]
    pub const fn kind(&self) -> StatusKind {
        self.initial.kind()
    }
}

const fn entry(
    id: StatusId,
    name: &'static str,
    doc: &'static str,
    initial: InitialValue,
    threshold: u32,
) -> StatusSpec {
    StatusSpec {
        id,
        name,
        doc,
        initial,
        threshold,
    }
}

const BOOL_DOC: &str = "False|True";
const UINT8_DOC: &str = "range[0..255]";

use InitialValue as V;
use StatusId as S;

/// The status catalogue, indexed by [`StatusId`].
pub static CATALOGUE: [StatusSpec; STATUS_COUNT] = [
    entry(S::FlippersPosition, "flippers_position", "DOWN|UP", V::Str("DOWN"), 1),
    entry(S::FlippersRemainingMovements, "flippers_remaining_movements", UINT8_DOC, V::Uint8(0), 1),
    entry(S::SpinningDirection, "spinning_direction", "NONE|LEFT|RIGHT", V::Str("NONE"), 1),
    entry(S::SpinningRemainingMovements, "spinning_remaining_movements", UINT8_DOC, V::Uint8(0), 1),
    entry(S::LeftWingButton, "left_wing_button", BOOL_DOC, V::Bool(false), 1),
    entry(S::RightWingButton, "right_wing_button", BOOL_DOC, V::Bool(false), 1),
    entry(S::HeadButton, "head_button", BOOL_DOC, V::Bool(false), 1),
    entry(S::RemoteButton, "remote_button", "K_<remote button>|RELEASE", V::Str("RELEASE"), 1),
    entry(S::MouthPosition, "mouth_position", "OPEN|CLOSE|NDEF", V::Str("CLOSE"), 1),
    entry(S::MouthRemainingMovements, "mouth_remaining_movements", UINT8_DOC, V::Uint8(0), 1),
    entry(S::EyesPosition, "eyes_position", "OPEN|CLOSE|NDEF", V::Str("CLOSE"), 1),
    entry(S::EyesRemainingMovements, "eyes_remaining_movements", UINT8_DOC, V::Uint8(0), 1),
    entry(S::DescriptorComplete, "descriptor_complete", "True", V::Bool(false), 1),
    entry(S::RadioState, "radio_state", BOOL_DOC, V::Bool(false), 1),
    entry(S::DonglePlug, "dongle_plug", BOOL_DOC, V::Bool(false), 1),
    entry(
        S::ChargerState,
        "charger_state",
        "UNPLUGGED|CHARGING|PLUGGED_NO_POWER|TRICKLE|INHIBITED",
        V::Str("UNPLUGGED"),
        1,
    ),
    entry(S::BatteryLevel, "battery_level", "range[4000..6500] (mV)", V::Int(0), 1),
    entry(S::BatteryState, "battery_state", "EMPTY|LOW|HIGH|FULL", V::Str("EMPTY"), 1),
    entry(S::LightLevel, "light_level", "range[0.0..100.0]", V::Float(0.0), 1000),
    entry(S::LeftLedState, "left_led_state", "ON|OFF|CHANGING", V::Str("OFF"), 1),
    entry(S::RightLedState, "right_led_state", "ON|OFF|CHANGING", V::Str("OFF"), 1),
    entry(S::ConnectionQuality, "connection_quality", "range[0..100]", V::Int(0), 1),
    entry(S::AudioFlashPlay, "audio_flash_play", "TRACK_<range[0..255]>|STOP", V::Str("STOP"), 1),
    entry(S::AudioGeneralPlay, "audio_general_play", BOOL_DOC, V::Bool(false), 1),
    entry(S::FlashProgrammingCurrentTrack, "flash_programming_current_track", UINT8_DOC, V::Uint8(0), 1),
    entry(S::FlashProgrammingLastTrackSize, "flash_programming_last_track_size", "<track size>", V::Int(0), 1),
    entry(S::TuxcoreSymbolicVersion, "tuxcore_symbolic_version", "<string>", V::Str("Tuxcore 0.0.0"), 1),
    entry(S::TuxaudioSymbolicVersion, "tuxaudio_symbolic_version", "<string>", V::Str("Tuxaudio 0.0.0"), 1),
    entry(S::FuxusbSymbolicVersion, "fuxusb_symbolic_version", "<string>", V::Str("FuxUSB 0.0.0"), 1),
    entry(S::FuxrfSymbolicVersion, "fuxrf_symbolic_version", "<string>", V::Str("FuxRF 0.0.0"), 1),
    entry(S::TuxrfSymbolicVersion, "tuxrf_symbolic_version", "<string>", V::Str("TuxRF 0.0.0"), 1),
    entry(S::DriverSymbolicVersion, "driver_symbolic_version", "<string>", V::Str(""), 1),
    entry(S::SoundReflashBegin, "sound_reflash_begin", "<seconds>", V::Float(0.0), 1000),
    entry(
        S::SoundReflashEnd,
        "sound_reflash_end",
        "NO_ERROR|ERROR_RF_OFFLINE|ERROR_WAV|ERROR_USB",
        V::Str("NO_ERROR"),
        1,
    ),
    entry(S::SoundReflashCurrentTrack, "sound_reflash_current_track", UINT8_DOC, V::Uint8(0), 1),
    entry(S::EyesMotorOn, "eyes_motor_on", BOOL_DOC, V::Bool(false), 1),
    entry(S::MouthMotorOn, "mouth_motor_on", BOOL_DOC, V::Bool(false), 1),
    entry(S::FlippersMotorOn, "flippers_motor_on", BOOL_DOC, V::Bool(false), 1),
    entry(S::SpinLeftMotorOn, "spin_left_motor_on", BOOL_DOC, V::Bool(false), 1),
    entry(S::SpinRightMotorOn, "spin_right_motor_on", BOOL_DOC, V::Bool(false), 1),
    entry(S::SoundFlashCount, "sound_flash_count", UINT8_DOC, V::Uint8(0), 1),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_dense_indices() {
        for (i, spec) in CATALOGUE.iter().enumerate() {
            assert_eq!(spec.id.index(), i, "entry {}", spec.name);
            assert_eq!(StatusId::from_index(i), Some(spec.id));
        }
        assert_eq!(StatusId::from_index(STATUS_COUNT), None);
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = CATALOGUE.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), STATUS_COUNT);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(StatusId::from_name("battery_level"), Some(StatusId::BatteryLevel));
        assert_eq!(StatusId::from_name("sound_flash_count"), Some(StatusId::SoundFlashCount));
        assert_eq!(StatusId::from_name("no_such_status"), None);
    }

    #[test]
    fn value_rendering() {
        assert_eq!(StatusValue::Bool(true).to_string(), "True");
        assert_eq!(StatusValue::Uint8(7).to_string(), "7");
        assert_eq!(StatusValue::Int(-3).to_string(), "-3");
        assert_eq!(StatusValue::Float(12.5).to_string(), "12.500000");
        assert_eq!(StatusValue::Str("OPEN".into()).to_string(), "OPEN");
    }

    #[test]
    fn kinds_follow_initial_values() {
        assert_eq!(StatusId::LightLevel.spec().kind(), StatusKind::Float);
        assert_eq!(StatusId::BatteryLevel.spec().kind(), StatusKind::Int);
        assert_eq!(StatusId::RemoteButton.spec().kind().name(), "string");
    }
}
