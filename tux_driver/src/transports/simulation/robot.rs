//! Simulated robot body.
//!
//! One [`tick`](SimulatedRobot::tick) per polling report. A running actuator
//! performs one movement per tick; each movement flips it between its two
//! rest positions. Command frames are applied immediately and answers
//! (versions, id, pongs) are queued for the next reports.

use std::collections::VecDeque;
use tracing::{debug, trace};
use tux_common::consts::MAX_FRAMES_PER_REPORT;
use tux_common::descriptor::CpuId;
use tux_common::protocol::frame::{Frame, FrameHeader};
use tux_common::protocol::opcodes::{
    AUDIO_MUTE, CONNECTION_DISCONNECT, CONNECTION_ID_REQUEST, DONGLE_CONNECTION, DONGLE_VERSION,
    EYES_BLINK, EYES_CLOSE, EYES_OPEN, EYES_STOP, FLIPPERS_LOWER, FLIPPERS_RAISE, FLIPPERS_STOP,
    FLIPPERS_WAVE, LED_PULSE, LED_PULSE_RANGE, LED_SET, MOTORS_SET, MOUTH_CLOSE, MOUTH_MOVE,
    MOUTH_OPEN, MOUTH_STOP, PING, SOUND_CONFIRM, SOUND_ERASE, SOUND_PLAY, SPIN_LEFT, SPIN_RIGHT,
    SPIN_STOP,
};
use tux_common::protocol::registers::{
    CpuVersion, LedEffectStatus, Motors, PortB, PortD, ReleaseType, Sensors,
};

/// Ticks between two battery, light and sound bank reports.
const SLOW_PERIOD: u32 = 10;

/// Ticks the radio stays down after a disconnect request.
const RF_RECONNECT_TICKS: u32 = 10;

/// Ticks a flash track keeps playing.
const PLAY_TICKS: u32 = 5;

/// Simulated firmware version of every CPU.
const FIRMWARE: (u8, u8, u8) = (0, 3, 1);

const FIRMWARE_REVISION: u16 = 1000;

/// Simulated connection id.
const ROBOT_ID: u16 = 0x0101;

/// Raw battery measure, about 4.9 V.
const BATTERY_RAW: u16 = 660;

/// Raw light measure in high-gain mode.
const LIGHT_RAW: u16 = 512;

/// Flash usage per stored track.
const USAGE_PER_TRACK: u8 = 4;

/// Two-position actuator: eyes, mouth or flippers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actuator {
    /// At the open or up position.
    pub open: bool,
    /// Movements left.
    pub remaining: u8,
    running: bool,
    continuous: bool,
}

impl Actuator {
    fn start(&mut self, count: u8) {
        if count == 0 {
            self.continuous = true;
            self.remaining = 0;
        } else {
            self.continuous = false;
            self.remaining = count;
        }
        self.running = true;
    }

    fn move_to(&mut self, open: bool) {
        if self.open != open {
            self.start(1);
        } else {
            self.stop();
        }
    }

    fn stop(&mut self) {
        self.running = false;
        self.continuous = false;
        self.remaining = 0;
    }

    /// Whether the motor is on.
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.open = !self.open;
        if !self.continuous {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.running = false;
            }
        }
    }
}

/// Spinning motor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spinner {
    /// Quarter turns left.
    pub remaining: u8,
    /// Turning left, otherwise right.
    pub left: bool,
    running: bool,
    continuous: bool,
}

impl Spinner {
    fn start(&mut self, left: bool, count: u8) {
        self.left = left;
        self.remaining = count;
        self.continuous = count == 0;
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.continuous = false;
        self.remaining = 0;
    }

    fn tick(&mut self) {
        if self.running && !self.continuous {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.running = false;
            }
        }
    }
}

/// Simulated robot and dongle firmware.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    /// Eyes.
    pub eyes: Actuator,
    /// Mouth.
    pub mouth: Actuator,
    /// Flippers.
    pub flippers: Actuator,
    /// Spinning motor.
    pub spin: Spinner,
    /// Left and right LED intensities.
    pub leds: [u8; 2],
    led_pulse_range: (u8, u8),
    led_pulse_ticks: [u32; 2],
    /// Tracks in the sound bank.
    pub sound_count: u8,
    flash_usage: u8,
    playing: Option<(u8, u32)>,
    muted: bool,
    pongs_pending: u8,
    rf_down_ticks: u32,
    ticks: u32,
    answers: VecDeque<Frame>,
}

impl Default for SimulatedRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRobot {
    /// Robot at rest: eyes open, mouth closed, flippers down, LEDs off.
    pub fn new() -> Self {
        Self {
            eyes: Actuator {
                open: true,
                ..Actuator::default()
            },
            mouth: Actuator::default(),
            flippers: Actuator::default(),
            spin: Spinner::default(),
            leds: [0, 0],
            led_pulse_range: (0, 255),
            led_pulse_ticks: [0, 0],
            sound_count: 0,
            flash_usage: 0,
            playing: None,
            muted: false,
            pongs_pending: 0,
            rf_down_ticks: 0,
            ticks: 0,
            answers: VecDeque::new(),
        }
    }

    /// Whether the radio link is up.
    pub fn rf_online(&self) -> bool {
        self.rf_down_ticks == 0
    }

    fn actuator(&mut self, part: u8) -> Option<&mut Actuator> {
        match part {
            0 => Some(&mut self.eyes),
            1 => Some(&mut self.mouth),
            2 => Some(&mut self.flippers),
            _ => None,
        }
    }

    fn queue_versions(&mut self, cpu: CpuId) {
        let (major, minor, update) = FIRMWARE;
        let cm = CpuVersion {
            cpu_number: cpu as u8,
            major,
        };
        let [rev_msb, rev_lsb] = FIRMWARE_REVISION.to_be_bytes();
        self.answers.extend([
            [FrameHeader::Version as u8, cm.to_byte(), minor, update],
            [
                FrameHeader::Revision as u8,
                rev_lsb,
                rev_msb,
                ReleaseType::ORIGINAL_RELEASE.bits(),
            ],
            [FrameHeader::Author as u8, 0, 0, 0],
        ]);
    }

    fn for_leds(&mut self, mask: u8, mut f: impl FnMut(&mut u8, &mut u32)) {
        for (i, bit) in [1u8, 2].into_iter().enumerate() {
            if mask & bit != 0 {
                f(&mut self.leds[i], &mut self.led_pulse_ticks[i]);
            }
        }
    }

    /// Apply a frame routed to the robot.
    pub fn apply_tux(&mut self, frame: &Frame) {
        trace!("robot <- {:02x?}", frame);
        let [opcode, a, b, _] = *frame;
        match opcode {
            EYES_OPEN => self.eyes.move_to(true),
            EYES_CLOSE => self.eyes.move_to(false),
            EYES_STOP => self.eyes.stop(),
            EYES_BLINK => self.eyes.start(a),
            MOUTH_OPEN => self.mouth.move_to(true),
            MOUTH_CLOSE => self.mouth.move_to(false),
            MOUTH_STOP => self.mouth.stop(),
            MOUTH_MOVE => self.mouth.start(a),
            FLIPPERS_RAISE => self.flippers.move_to(true),
            FLIPPERS_LOWER => self.flippers.move_to(false),
            FLIPPERS_STOP => self.flippers.stop(),
            FLIPPERS_WAVE => self.flippers.start(a),
            SPIN_LEFT => self.spin.start(true, a),
            SPIN_RIGHT => self.spin.start(false, a),
            SPIN_STOP => self.spin.stop(),
            MOTORS_SET => match a {
                3 | 4 if b == 0 && frame[3] == 0 => self.spin.stop(),
                3 => self.spin.start(false, b.max(1)),
                4 => self.spin.start(true, b.max(1)),
                part => {
                    let count = if frame[3] == 1 { 1 } else { b };
                    if let Some(actuator) = self.actuator(part) {
                        actuator.start(count);
                    }
                }
            },
            LED_SET => self.for_leds(a, |led, pulse| {
                *led = b;
                *pulse = 0;
            }),
            LED_PULSE_RANGE => self.led_pulse_range = (frame[3], b),
            LED_PULSE => {
                let (_, high) = self.led_pulse_range;
                let ticks = u32::from(b) * 2;
                self.for_leds(a, |led, pulse| {
                    *led = high;
                    *pulse = ticks;
                });
            }
            PING => self.pongs_pending = a,
            SOUND_PLAY => {
                if a != 0 && a <= self.sound_count {
                    self.playing = Some((a, PLAY_TICKS));
                    self.answers.push_back([FrameHeader::Audio as u8, a, 0, 0]);
                }
            }
            SOUND_ERASE => {
                self.sound_count = 0;
                self.flash_usage = 0;
            }
            SOUND_CONFIRM if a != 0 => {
                self.sound_count = self.sound_count.saturating_add(1);
                self.flash_usage = self.flash_usage.saturating_add(USAGE_PER_TRACK);
                self.answers.push_back(self.sound_var_frame());
            }
            AUDIO_MUTE => self.muted = a != 0,
            0x02..=0x05 => {
                if let Some(cpu) = CpuId::from_u8(opcode - 2) {
                    self.queue_versions(cpu);
                }
            }
            _ => debug!("Simulated robot ignores {:02x?}", frame),
        }
    }

    /// Apply a frame routed to the dongle.
    pub fn apply_dongle(&mut self, frame: &Frame) {
        trace!("dongle <- {:02x?}", frame);
        match (frame[0], frame[1]) {
            (DONGLE_CONNECTION, CONNECTION_ID_REQUEST) => {
                let [msb, lsb] = ROBOT_ID.to_be_bytes();
                self.answers.push_back([FrameHeader::Id as u8, msb, lsb, 0]);
            }
            (DONGLE_CONNECTION, CONNECTION_DISCONNECT) => {
                self.rf_down_ticks = RF_RECONNECT_TICKS;
            }
            (DONGLE_VERSION, _) => self.queue_versions(CpuId::FuxUsb),
            _ => debug!("Simulated dongle ignores {:02x?}", frame),
        }
    }

    fn motors(&self) -> Motors {
        let mut motors = Motors::empty();
        motors.set(Motors::EYES_ON, self.eyes.running);
        motors.set(Motors::MOUTH_ON, self.mouth.running);
        motors.set(Motors::FLIPPERS_ON, self.flippers.running);
        motors.set(Motors::SPIN_LEFT_ON, self.spin.running && self.spin.left);
        motors.set(Motors::SPIN_RIGHT_ON, self.spin.running && !self.spin.left);
        motors
    }

    fn ports_frame(&self) -> Frame {
        // limit switches are active low; both released while moving
        let mut portb = PortB::MOUTH_OPEN_SWITCH | PortB::MOUTH_CLOSED_SWITCH;
        if !self.mouth.running {
            portb.remove(if self.mouth.open {
                PortB::MOUTH_OPEN_SWITCH
            } else {
                PortB::MOUTH_CLOSED_SWITCH
            });
        }
        let mut portd = PortD::EYES_OPEN_SWITCH | PortD::EYES_CLOSED_SWITCH;
        if !self.eyes.running {
            portd.remove(if self.eyes.open {
                PortD::EYES_OPEN_SWITCH
            } else {
                PortD::EYES_CLOSED_SWITCH
            });
        }
        [FrameHeader::Ports as u8, portb.bits(), 0, portd.bits()]
    }

    fn sensors_frame(&self) -> Frame {
        let mut sensors = Sensors::POWER_PLUG_INSERTION_SWITCH;
        sensors.set(Sensors::MUTE_STATUS, self.muted);
        sensors.set(Sensors::RF_CONNECTION_STATUS, self.rf_online());
        let playing = u8::from(self.playing.is_some());
        [FrameHeader::Sensors1 as u8, sensors.bits(), playing, 0]
    }

    fn led_frame(&self) -> Frame {
        let mut effects = LedEffectStatus::empty();
        effects.set(LedEffectStatus::LEFT_PULSING, self.led_pulse_ticks[0] > 0);
        effects.set(LedEffectStatus::RIGHT_PULSING, self.led_pulse_ticks[1] > 0);
        [FrameHeader::Led as u8, self.leds[0], self.leds[1], effects.bits()]
    }

    fn sound_var_frame(&self) -> Frame {
        [FrameHeader::SoundVar as u8, self.sound_count, self.flash_usage, 0]
    }

    fn slow_frames(&self) -> [Frame; 3] {
        let [bat_high, bat_low] = BATTERY_RAW.to_be_bytes();
        let [light_high, light_low] = LIGHT_RAW.to_be_bytes();
        let motors_state = u8::from(!self.motors().is_empty());
        [
            [FrameHeader::Battery as u8, bat_high, bat_low, motors_state],
            [FrameHeader::Light as u8, light_high, light_low, 1],
            self.sound_var_frame(),
        ]
    }

    /// Advance one polling period and return the status frames of the
    /// report, at most 15.
    pub fn tick(&mut self) -> Vec<Frame> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.rf_down_ticks > 0 {
            self.rf_down_ticks -= 1;
            return Vec::new();
        }

        self.eyes.tick();
        self.mouth.tick();
        self.flippers.tick();
        self.spin.tick();
        for (led, pulse) in self.leds.iter_mut().zip(self.led_pulse_ticks.iter_mut()) {
            if *pulse > 0 {
                *pulse -= 1;
                if *pulse == 0 {
                    *led = self.led_pulse_range.0;
                }
            }
        }
        if let Some((track, left)) = self.playing {
            self.playing = (left > 1).then_some((track, left - 1));
        }

        let mut frames = vec![
            self.ports_frame(),
            self.sensors_frame(),
            [
                FrameHeader::Position1 as u8,
                self.eyes.remaining,
                self.mouth.remaining,
                self.flippers.remaining,
            ],
            [
                FrameHeader::Position2 as u8,
                self.spin.remaining,
                u8::from(self.flippers.open),
                self.motors().bits(),
            ],
            self.led_frame(),
        ];
        if self.ticks % SLOW_PERIOD == 1 {
            frames.extend(self.slow_frames());
        }
        for _ in 0..2 {
            if self.pongs_pending == 0 {
                break;
            }
            self.pongs_pending -= 1;
            frames.push([FrameHeader::Pong as u8, self.pongs_pending, 0, 0]);
        }
        while frames.len() < MAX_FRAMES_PER_REPORT {
            let Some(answer) = self.answers.pop_front() else {
                break;
            };
            frames.push(answer);
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(frames: &[Frame], header: FrameHeader) -> Option<Frame> {
        frames.iter().copied().find(|f| f[0] == header as u8)
    }

    // ─── Actuators ──────────────────────────────────────────────────

    #[test]
    fn counted_movement_stops() {
        let mut robot = SimulatedRobot::new();
        robot.apply_tux(&[EYES_BLINK, 2, 0, 0]);
        robot.tick();
        assert!(!robot.eyes.open);
        assert!(robot.eyes.is_running());
        robot.tick();
        assert!(robot.eyes.open);
        assert!(!robot.eyes.is_running());
    }

    #[test]
    fn single_move_reaches_target() {
        let mut robot = SimulatedRobot::new();
        robot.apply_tux(&[MOUTH_OPEN, 0, 0, 0]);
        robot.tick();
        assert!(robot.mouth.open);
        robot.apply_tux(&[MOUTH_OPEN, 0, 0, 0]);
        assert!(!robot.mouth.is_running());
    }

    #[test]
    fn ports_report_switches_active_low() {
        let mut robot = SimulatedRobot::new();
        let ports = find(&robot.tick(), FrameHeader::Ports).unwrap();
        // eyes open: open switch pressed, mouth closed: closed switch pressed
        assert_eq!(ports[3] & PortD::EYES_OPEN_SWITCH.bits(), 0);
        assert_ne!(ports[3] & PortD::EYES_CLOSED_SWITCH.bits(), 0);
        assert_eq!(ports[1] & PortB::MOUTH_CLOSED_SWITCH.bits(), 0);
    }

    // ─── Answers ────────────────────────────────────────────────────

    #[test]
    fn version_request_is_answered() {
        let mut robot = SimulatedRobot::new();
        robot.apply_tux(&[0x03, 0, 0, 0]);
        let frames = robot.tick();
        let version = find(&frames, FrameHeader::Version).unwrap();
        assert_eq!(CpuVersion::from_byte(version[1]).cpu_number, CpuId::Tuxaudio as u8);
        assert!(find(&frames, FrameHeader::Revision).is_some());
        assert!(find(&frames, FrameHeader::Author).is_some());
    }

    #[test]
    fn id_request_and_disconnect() {
        let mut robot = SimulatedRobot::new();
        robot.apply_dongle(&[DONGLE_CONNECTION, CONNECTION_ID_REQUEST, 0, 0]);
        assert_eq!(find(&robot.tick(), FrameHeader::Id), Some([0xC6, 0x01, 0x01, 0]));
        robot.apply_dongle(&[DONGLE_CONNECTION, CONNECTION_DISCONNECT, 0, 0]);
        assert!(!robot.rf_online());
        for _ in 0..RF_RECONNECT_TICKS {
            assert!(robot.tick().is_empty());
        }
        assert!(robot.rf_online());
    }

    #[test]
    fn reports_never_exceed_capacity() {
        let mut robot = SimulatedRobot::new();
        robot.apply_tux(&[PING, 200, 0, 0]);
        for cpu in 0..4u8 {
            robot.apply_tux(&[cpu + 2, 0, 0, 0]);
        }
        for _ in 0..3 {
            assert!(robot.tick().len() <= MAX_FRAMES_PER_REPORT);
        }
    }

    #[test]
    fn confirmed_tracks_fill_the_bank() {
        let mut robot = SimulatedRobot::new();
        robot.apply_tux(&[SOUND_ERASE, 0, 0, 0]);
        robot.apply_tux(&[SOUND_CONFIRM, 1, 0, 0]);
        robot.apply_tux(&[SOUND_CONFIRM, 0, 0, 0]);
        assert_eq!(robot.sound_count, 1);
        robot.apply_tux(&[SOUND_PLAY, 1, 0, 0]);
        let frames = robot.tick();
        assert_eq!(find(&frames, FrameHeader::Audio), Some([0xCC, 1, 0, 0]));
    }
}
