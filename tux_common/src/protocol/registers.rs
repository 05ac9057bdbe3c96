//! Hardware register decoders.
//!
//! Bit 0 is the least significant bit of the raw byte. Flag-only registers
//! are `bitflags` types built with `from_bits_retain` so that undocumented
//! bits survive a round trip; mixed-width registers are plain structs.

use bitflags::bitflags;

bitflags! {
    /// Port B of the core CPU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PortB: u8 {
        /// Flippers motor, backward direction.
        const FLIPPERS_MOTOR_BACKWARD = 0x01;
        /// Spin motor, forward direction.
        const SPIN_MOTOR_FORWARD      = 0x02;
        /// Spin motor, backward direction.
        const SPIN_MOTOR_BACKWARD     = 0x04;
        /// Mouth open switch (active low).
        const MOUTH_OPEN_SWITCH       = 0x08;
        /// Mouth closed switch (active low).
        const MOUTH_CLOSED_SWITCH     = 0x10;
        /// Head push switch.
        const HEAD_PUSH_SWITCH        = 0x20;
        /// Charger inhibit signal.
        const CHARGER_INHIBIT_SIGNAL  = 0x40;
        /// External I/O line.
        const EXTERNAL_IO             = 0x80;
    }
}

bitflags! {
    /// Port C of the core CPU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PortC: u8 {
        /// Photo transistor pull-up.
        const PHOTO_TRANSISTOR_PULL_UP = 0x01;
        /// Flippers position switch.
        const FLIPPERS_POSITION_SWITCH = 0x02;
        /// Right blue LED.
        const RIGHT_BLUE_LED           = 0x04;
        /// Left blue LED.
        const LEFT_BLUE_LED            = 0x08;
        /// I2C data line.
        const I2C_SDA                  = 0x10;
        /// I2C clock line.
        const I2C_SCL                  = 0x20;
        /// Reset line.
        const RESET                    = 0x40;
    }
}

bitflags! {
    /// Port D of the core CPU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PortD: u8 {
        /// Head motor driving the mouth.
        const HEAD_MOTOR_FOR_MOUTH   = 0x01;
        /// Head motor driving the eyes.
        const HEAD_MOTOR_FOR_EYES    = 0x02;
        /// IR receiver signal.
        const IR_RECEIVER_SIGNAL     = 0x04;
        /// Spin position switch.
        const SPIN_POSITION_SWITCH   = 0x08;
        /// Flippers motor, forward direction.
        const FLIPPERS_MOTOR_FORWARD = 0x10;
        /// IR emitter LED.
        const IR_LED                 = 0x20;
        /// Eyes open switch (active low).
        const EYES_OPEN_SWITCH       = 0x40;
        /// Eyes closed switch (active low).
        const EYES_CLOSED_SWITCH     = 0x80;
    }
}

bitflags! {
    /// Switch sensors reported in the SENSORS1 frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Sensors: u8 {
        /// Left wing button.
        const LEFT_WING_PUSH_BUTTON       = 0x01;
        /// Right wing button.
        const RIGHT_WING_PUSH_BUTTON      = 0x02;
        /// Power plug inserted.
        const POWER_PLUG_INSERTION_SWITCH = 0x04;
        /// Head button.
        const HEAD_PUSH_BUTTON            = 0x08;
        /// Charger LED lit.
        const CHARGER_LED_STATUS          = 0x10;
        /// RF connection up.
        const RF_CONNECTION_STATUS        = 0x20;
        /// Internal power switch.
        const INTERNAL_POWER_SWITCH       = 0x40;
        /// Audio amplifier muted.
        const MUTE_STATUS                 = 0x80;
    }
}

bitflags! {
    /// Motor activity reported in the POSITION2 frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Motors: u8 {
        /// Spin motor turning right.
        const SPIN_RIGHT_ON = 0x01;
        /// Spin motor turning left.
        const SPIN_LEFT_ON  = 0x02;
        /// Eyes motor running.
        const EYES_ON       = 0x04;
        /// Mouth motor running.
        const MOUTH_ON      = 0x08;
        /// Flippers motor running.
        const FLIPPERS_ON   = 0x10;
    }
}

bitflags! {
    /// LED effect state reported in the LED frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LedEffectStatus: u8 {
        /// Left LED fading.
        const LEFT_FADING   = 0x01;
        /// Left LED pulsing.
        const LEFT_PULSING  = 0x02;
        /// Right LED fading.
        const RIGHT_FADING  = 0x04;
        /// Right LED pulsing.
        const RIGHT_PULSING = 0x08;
        /// LED mask active.
        const LED_MASK      = 0x10;
    }
}

bitflags! {
    /// Release flags reported in the REVISION frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReleaseType: u8 {
        /// Built from locally modified sources.
        const LOCAL_MODIFICATION = 0x01;
        /// Built from mixed revisions.
        const MIXED_UPDATE       = 0x02;
        /// Official release.
        const ORIGINAL_RELEASE   = 0x04;
    }
}

bitflags! {
    /// Sound flash programming steps reported in the AUDIO frame.
    ///
    /// Bits 3..7 hold the number of tracks, see [`ProgrammingSteps::sounds_track`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProgrammingSteps: u8 {
        /// No programming in progress.
        const NO_PROGRAMMING = 0x01;
        /// Flash erased.
        const FLASH_ERASED   = 0x02;
        /// Table of contents written.
        const TOC            = 0x04;
    }
}

impl ProgrammingSteps {
    /// Track counter held in the upper five bits.
    #[inline]
    pub const fn sounds_track(self) -> u8 {
        self.bits() >> 3
    }
}

/// RC5 code received by the IR sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rc5Code {
    /// Key code (6 bits).
    pub command: u8,
    /// Toggle bit, flips on every new key press.
    pub toggle: bool,
    /// A code was received since the last report.
    pub received: bool,
}

impl Rc5Code {
    /// Decode from the raw byte.
    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            command: byte & 0x3F,
            toggle: byte & 0x40 != 0,
            received: byte & 0x80 != 0,
        }
    }
}

/// First byte of the VERSION frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CpuVersion {
    /// CPU number (3 bits).
    pub cpu_number: u8,
    /// Major version (5 bits).
    pub major: u8,
}

impl CpuVersion {
    /// Decode from the raw byte.
    #[inline]
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            cpu_number: byte & 0x07,
            major: byte >> 3,
        }
    }

    /// Encode into the raw byte.
    #[inline]
    pub const fn to_byte(self) -> u8 {
        (self.cpu_number & 0x07) | (self.major << 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Flag registers ─────────────────────────────────────────────

    #[test]
    fn portd_switches_are_high_bits() {
        let d = PortD::from_bits_retain(0xC0);
        assert!(d.contains(PortD::EYES_OPEN_SWITCH));
        assert!(d.contains(PortD::EYES_CLOSED_SWITCH));
        assert!(!d.contains(PortD::IR_LED));
    }

    #[test]
    fn undocumented_bits_are_retained() {
        let c = PortC::from_bits_retain(0xFF);
        assert_eq!(c.bits(), 0xFF);
        let m = Motors::from_bits_retain(0xE3);
        assert!(m.contains(Motors::SPIN_RIGHT_ON | Motors::SPIN_LEFT_ON));
        assert_eq!(m.bits(), 0xE3);
    }

    #[test]
    fn programming_steps_track_counter() {
        let steps = ProgrammingSteps::from_bits_retain((5 << 3) | 0x02);
        assert!(steps.contains(ProgrammingSteps::FLASH_ERASED));
        assert_eq!(steps.sounds_track(), 5);
    }

    // ─── Mixed registers ────────────────────────────────────────────

    #[test]
    fn rc5_decoding() {
        let code = Rc5Code::from_byte(0xC5);
        assert_eq!(code.command, 0x05);
        assert!(code.toggle);
        assert!(code.received);
        assert_eq!(Rc5Code::from_byte(0x3F).command, 0x3F);
    }

    #[test]
    fn cpu_version_decoding() {
        let v = CpuVersion::from_byte(0x1A);
        assert_eq!(v.cpu_number, 2);
        assert_eq!(v.major, 3);
        assert_eq!(v.to_byte(), 0x1A);
    }
}
