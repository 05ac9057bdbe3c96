//! Hardware status snapshot.
//!
//! The snapshot keeps the last payload received for each of the 16 status
//! frame categories. [`HwStatus::update`] commits a frame and reports whether
//! the category changed; typed views decode a category's raw bytes on demand.

use std::fmt::Write;
use tux_common::consts::{FRAME_CATEGORY_COUNT, FRAME_COUNTER_DUMP_THRESHOLD};
use tux_common::protocol::frame::{Frame, FrameHeader};
use tux_common::protocol::registers::{
    CpuVersion, LedEffectStatus, Motors, PortB, PortC, PortD, ProgrammingSteps, Rc5Code,
    ReleaseType, Sensors,
};

/// Outcome of committing one status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUpdate {
    /// At least one significant payload byte differed.
    Changed(FrameHeader),
    /// The payload matched the stored one.
    Unchanged(FrameHeader),
    /// The header byte selects no known category.
    Unknown(u8),
}

impl FrameUpdate {
    /// Category of a recognized frame.
    pub fn header(self) -> Option<FrameHeader> {
        match self {
            Self::Changed(h) | Self::Unchanged(h) => Some(h),
            Self::Unknown(_) => None,
        }
    }

    /// Whether the category changed.
    #[inline]
    pub fn is_changed(self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

// ─── Typed views ────────────────────────────────────────────────────

/// PORTS frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortsBody {
    /// Port B.
    pub portb: PortB,
    /// Port C.
    pub portc: PortC,
    /// Port D.
    pub portd: PortD,
}

/// SENSORS1 frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sensors1Body {
    /// Switch sensors.
    pub sensors: Sensors,
    /// Internal sound playing.
    pub play_internal_sound: u8,
    /// General sound playing.
    pub play_general_sound: u8,
}

/// LIGHT frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightBody {
    /// Measure, high byte.
    pub high_level: u8,
    /// Measure, low byte.
    pub low_level: u8,
    /// Sensor mode.
    pub mode: u8,
}

/// POSITION1 frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position1Body {
    /// Eyes remaining movements.
    pub eyes_remaining: u8,
    /// Mouth remaining movements.
    pub mouth_remaining: u8,
    /// Flippers remaining movements.
    pub flippers_remaining: u8,
}

/// POSITION2 frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position2Body {
    /// Spin remaining movements.
    pub spin_remaining: u8,
    /// Non-zero when the flippers are down.
    pub flippers_down: u8,
    /// Motor activity.
    pub motors: Motors,
}

/// BATTERY frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryBody {
    /// Measure, high byte.
    pub high_level: u8,
    /// Measure, low byte.
    pub low_level: u8,
    /// Non-zero when a motor is running.
    pub motors_state: u8,
}

/// VERSION frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionBody {
    /// CPU number and major version.
    pub cm: CpuVersion,
    /// Minor version.
    pub minor: u8,
    /// Update version.
    pub update: u8,
}

/// REVISION frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevisionBody {
    /// Revision, low byte.
    pub lsb: u8,
    /// Revision, high byte.
    pub msb: u8,
    /// Release flags.
    pub release_type: ReleaseType,
}

/// AUTHOR frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthorBody {
    /// Author, low byte.
    pub lsb: u8,
    /// Author, high byte.
    pub msb: u8,
    /// Variation number.
    pub variation: u8,
}

/// AUDIO frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioBody {
    /// Track being played, 0 when idle.
    pub sound_track_played: u8,
    /// Programming steps.
    pub programming_steps: ProgrammingSteps,
    /// Last programmed track.
    pub programmed_sound_track: u8,
}

/// SOUND_VAR frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundVarBody {
    /// Stored tracks.
    pub number_of_sounds: u8,
    /// Last used block.
    pub flash_usage: u8,
}

/// FLASH_PROG frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlashProgBody {
    /// Track being programmed.
    pub current_state: u8,
    /// Size of the last programmed track.
    pub last_sound_size: u8,
}

/// LED frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedBody {
    /// Left LED intensity.
    pub left_intensity: u8,
    /// Right LED intensity.
    pub right_intensity: u8,
    /// Effect state.
    pub effect_status: LedEffectStatus,
}

/// PONG frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PongBody {
    /// Pongs still pending in the dongle.
    pub pending: u8,
    /// Pongs lost on the I2C bus.
    pub lost_by_i2c: u8,
    /// Pongs lost on the radio link.
    pub lost_by_rf: u8,
}

// ─── Snapshot ───────────────────────────────────────────────────────

/// Last received payload of every frame category.
#[derive(Debug, Clone, Copy, Default)]
pub struct HwStatus {
    bodies: [[u8; 3]; FRAME_CATEGORY_COUNT],
    counters: [u8; FRAME_CATEGORY_COUNT],
}

impl HwStatus {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every payload and counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Commit one status frame.
    ///
    /// Only the significant payload bytes of the category are compared and
    /// stored. The category's receipt counter advances in every case.
    pub fn update(&mut self, frame: &Frame) -> FrameUpdate {
        let Some(header) = FrameHeader::from_u8(frame[0]) else {
            return FrameUpdate::Unknown(frame[0]);
        };
        let index = header.index();
        let len = header.payload_len();
        self.counters[index] = self.counters[index].wrapping_add(1);

        let body = &mut self.bodies[index];
        if body[..len] == frame[1..=len] {
            return FrameUpdate::Unchanged(header);
        }
        body[..len].copy_from_slice(&frame[1..=len]);
        FrameUpdate::Changed(header)
    }

    /// Sum of the receipt counters since the last check.
    pub fn counters_total(&self) -> u32 {
        self.counters.iter().map(|&c| u32::from(c)).sum()
    }

    /// End-of-cycle counter check.
    ///
    /// Returns a per-category dump when the combined count reached the
    /// threshold. Counters are cleared in every case.
    pub fn check_counters(&mut self) -> Option<String> {
        let total = self.counters_total();
        let dump = (total >= FRAME_COUNTER_DUMP_THRESHOLD).then(|| {
            let mut out = format!("Frames counter ({total}) :");
            for header in FrameHeader::ALL {
                let _ = write!(out, "\n\t{}:[{}]", header.name(), self.counters[header.index()]);
            }
            out
        });
        self.counters = [0; FRAME_CATEGORY_COUNT];
        dump
    }

    /// Raw significant payload of a category.
    pub fn body(&self, header: FrameHeader) -> &[u8] {
        &self.bodies[header.index()][..header.payload_len()]
    }

    #[inline]
    fn raw(&self, header: FrameHeader) -> [u8; 3] {
        self.bodies[header.index()]
    }

    /// PORTS view.
    pub fn ports(&self) -> PortsBody {
        let [b, c, d] = self.raw(FrameHeader::Ports);
        PortsBody {
            portb: PortB::from_bits_retain(b),
            portc: PortC::from_bits_retain(c),
            portd: PortD::from_bits_retain(d),
        }
    }

    /// SENSORS1 view.
    pub fn sensors1(&self) -> Sensors1Body {
        let [s, internal, general] = self.raw(FrameHeader::Sensors1);
        Sensors1Body {
            sensors: Sensors::from_bits_retain(s),
            play_internal_sound: internal,
            play_general_sound: general,
        }
    }

    /// LIGHT view.
    pub fn light(&self) -> LightBody {
        let [high_level, low_level, mode] = self.raw(FrameHeader::Light);
        LightBody {
            high_level,
            low_level,
            mode,
        }
    }

    /// POSITION1 view.
    pub fn position1(&self) -> Position1Body {
        let [eyes, mouth, flippers] = self.raw(FrameHeader::Position1);
        Position1Body {
            eyes_remaining: eyes,
            mouth_remaining: mouth,
            flippers_remaining: flippers,
        }
    }

    /// POSITION2 view.
    pub fn position2(&self) -> Position2Body {
        let [spin, flippers_down, motors] = self.raw(FrameHeader::Position2);
        Position2Body {
            spin_remaining: spin,
            flippers_down,
            motors: Motors::from_bits_retain(motors),
        }
    }

    /// IR view.
    pub fn ir(&self) -> Rc5Code {
        Rc5Code::from_byte(self.raw(FrameHeader::Ir)[0])
    }

    /// ID view: `(msb << 8) + lsb`.
    pub fn id_number(&self) -> u32 {
        let [msb, lsb, _] = self.raw(FrameHeader::Id);
        (u32::from(msb) << 8) + u32::from(lsb)
    }

    /// BATTERY view.
    pub fn battery(&self) -> BatteryBody {
        let [high_level, low_level, motors_state] = self.raw(FrameHeader::Battery);
        BatteryBody {
            high_level,
            low_level,
            motors_state,
        }
    }

    /// VERSION view.
    pub fn version(&self) -> VersionBody {
        let [cm, minor, update] = self.raw(FrameHeader::Version);
        VersionBody {
            cm: CpuVersion::from_byte(cm),
            minor,
            update,
        }
    }

    /// REVISION view.
    pub fn revision(&self) -> RevisionBody {
        let [lsb, msb, release] = self.raw(FrameHeader::Revision);
        RevisionBody {
            lsb,
            msb,
            release_type: ReleaseType::from_bits_retain(release),
        }
    }

    /// AUTHOR view.
    pub fn author(&self) -> AuthorBody {
        let [lsb, msb, variation] = self.raw(FrameHeader::Author);
        AuthorBody {
            lsb,
            msb,
            variation,
        }
    }

    /// AUDIO view.
    pub fn audio(&self) -> AudioBody {
        let [played, steps, programmed] = self.raw(FrameHeader::Audio);
        AudioBody {
            sound_track_played: played,
            programming_steps: ProgrammingSteps::from_bits_retain(steps),
            programmed_sound_track: programmed,
        }
    }

    /// SOUND_VAR view.
    pub fn sound_var(&self) -> SoundVarBody {
        let [number_of_sounds, flash_usage, _] = self.raw(FrameHeader::SoundVar);
        SoundVarBody {
            number_of_sounds,
            flash_usage,
        }
    }

    /// FLASH_PROG view.
    pub fn flash_prog(&self) -> FlashProgBody {
        let [current_state, last_sound_size, _] = self.raw(FrameHeader::FlashProg);
        FlashProgBody {
            current_state,
            last_sound_size,
        }
    }

    /// LED view.
    pub fn led(&self) -> LedBody {
        let [left, right, effect] = self.raw(FrameHeader::Led);
        LedBody {
            left_intensity: left,
            right_intensity: right,
            effect_status: LedEffectStatus::from_bits_retain(effect),
        }
    }

    /// PONG view.
    pub fn pong(&self) -> PongBody {
        let [pending, lost_by_i2c, lost_by_rf] = self.raw(FrameHeader::Pong);
        PongBody {
            pending,
            lost_by_i2c,
            lost_by_rf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Change detection ───────────────────────────────────────────

    #[test]
    fn same_payload_twice_is_unchanged() {
        for header in FrameHeader::ALL {
            let mut hw = HwStatus::new();
            let frame = [header as u8, 0x11, 0x22, 0x33];
            assert_eq!(hw.update(&frame), FrameUpdate::Changed(header));
            assert_eq!(hw.update(&frame), FrameUpdate::Unchanged(header));
        }
    }

    #[test]
    fn one_byte_difference_is_committed() {
        for header in FrameHeader::ALL {
            let mut hw = HwStatus::new();
            hw.update(&[header as u8, 1, 2, 3]);
            let last = header.payload_len();
            let mut frame = [header as u8, 1, 2, 3];
            frame[last] ^= 0xFF;
            assert!(hw.update(&frame).is_changed(), "{}", header.name());
            assert_eq!(hw.body(header), &frame[1..=last]);
        }
    }

    #[test]
    fn insignificant_bytes_are_ignored() {
        let mut hw = HwStatus::new();
        hw.update(&[0xC5, 0x85, 0, 0]);
        assert_eq!(hw.update(&[0xC5, 0x85, 9, 9]), FrameUpdate::Unchanged(FrameHeader::Ir));
        assert_eq!(hw.body(FrameHeader::Ir), &[0x85]);
    }

    #[test]
    fn unknown_header_is_reported() {
        let mut hw = HwStatus::new();
        assert_eq!(hw.update(&[0x42, 1, 2, 3]), FrameUpdate::Unknown(0x42));
        assert_eq!(hw.counters_total(), 0);
    }

    // ─── Counters ───────────────────────────────────────────────────

    #[test]
    fn counters_dump_at_threshold_and_reset_every_check() {
        let mut hw = HwStatus::new();
        for _ in 0..3 {
            hw.update(&[0xC0, 0, 0, 0]);
        }
        assert!(hw.check_counters().is_none());
        assert_eq!(hw.counters_total(), 0);

        for _ in 0..15 {
            hw.update(&[0xC1, 0, 0, 0]);
        }
        let dump = hw.check_counters().unwrap();
        assert!(dump.starts_with("Frames counter (15) :"));
        assert!(dump.contains("SENSORS1:[15]"));
        assert_eq!(hw.counters_total(), 0);
    }

    // ─── Views ──────────────────────────────────────────────────────

    #[test]
    fn typed_views_decode_bytes() {
        let mut hw = HwStatus::new();
        hw.update(&[0xC0, 0x08, 0x02, 0x40]);
        let ports = hw.ports();
        assert!(ports.portb.contains(PortB::MOUTH_OPEN_SWITCH));
        assert!(ports.portd.contains(PortD::EYES_OPEN_SWITCH));

        hw.update(&[0xC6, 0x01, 0x02, 0]);
        assert_eq!(hw.id_number(), 0x0102);

        hw.update(&[0xC8, CpuVersion { cpu_number: 4, major: 0 }.to_byte(), 3, 1]);
        let v = hw.version();
        assert_eq!((v.cm.cpu_number, v.minor, v.update), (4, 3, 1));

        hw.update(&[0xC4, 2, 1, 0x14]);
        let p2 = hw.position2();
        assert!(p2.motors.contains(Motors::EYES_ON | Motors::FLIPPERS_ON));
        assert_eq!(p2.flippers_down, 1);
    }
}
