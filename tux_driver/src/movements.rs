//! Movement engine.
//!
//! Converts a movement request (count or duration, speed, final state) into
//! the motor frames for one body part. Planning is pure; the driver context
//! reads the limit-switch condition from the snapshot and sends the frames.

use heapless::Vec as HVec;
use tux_common::consts::FW_MAIN_LOOP_DELAY;
use tux_common::protocol::command::FinalState;
use tux_common::protocol::frame::Frame;
use tux_common::protocol::opcodes::{
    EYES_CLOSE, EYES_OPEN, EYES_STOP, FLIPPERS_LOWER, FLIPPERS_RAISE, FLIPPERS_STOP, MOTORS_CONFIG,
    MOTORS_SET, MOUTH_CLOSE, MOUTH_OPEN, MOUTH_STOP, SPIN_STOP,
};
use tux_common::protocol::registers::{PortB, PortD};

use crate::hw_status::HwStatus;

/// Default motor PWM.
pub const SPEED_HIGH: u8 = 5;

/// Durations below this are sent as a raw motor time.
pub const SHORT_MOVEMENT_LIMIT: f32 = 0.3;

/// Motor driven by a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BodyPart {
    /// Eyes.
    Eyes = 0,
    /// Mouth.
    Mouth = 1,
    /// Flippers.
    Flippers = 2,
    /// Spin motor, turning right.
    SpinRight = 3,
    /// Spin motor, turning left.
    SpinLeft = 4,
}

impl BodyPart {
    /// Measured duration of one movement in seconds.
    pub const fn move_time(self) -> f32 {
        match self {
            Self::Eyes => 0.2,
            Self::Mouth => 0.25,
            Self::Flippers => 0.3,
            Self::SpinRight | Self::SpinLeft => 0.2,
        }
    }

    /// Spin parts rotate continuously.
    #[inline]
    pub const fn is_spin(self) -> bool {
        matches!(self, Self::SpinRight | Self::SpinLeft)
    }

    /// Single-move frame reaching `final_state`, if the part has one.
    pub fn single_move(self, final_state: FinalState) -> Option<Frame> {
        let opcode = match (self, final_state) {
            (Self::Eyes, FinalState::OpenUp) => EYES_OPEN,
            (Self::Eyes, FinalState::CloseDown) => EYES_CLOSE,
            (Self::Eyes, FinalState::Stop) => EYES_STOP,
            (Self::Mouth, FinalState::OpenUp) => MOUTH_OPEN,
            (Self::Mouth, FinalState::CloseDown) => MOUTH_CLOSE,
            (Self::Mouth, FinalState::Stop) => MOUTH_STOP,
            (Self::Flippers, FinalState::OpenUp) => FLIPPERS_RAISE,
            (Self::Flippers, FinalState::CloseDown) => FLIPPERS_LOWER,
            (Self::Flippers, FinalState::Stop) => FLIPPERS_STOP,
            (Self::SpinRight | Self::SpinLeft, FinalState::Stop) => SPIN_STOP,
            _ => return None,
        };
        Some([opcode, 0, 0, 0])
    }

    /// Limit-switch condition: 1 when the part rests open or up.
    pub fn condition(self, hw: &HwStatus) -> u8 {
        match self {
            Self::Eyes => u8::from(hw.ports().portd.contains(PortD::EYES_OPEN_SWITCH)),
            Self::Mouth => u8::from(hw.ports().portb.contains(PortB::MOUTH_OPEN_SWITCH)),
            Self::Flippers => u8::from(hw.position2().flippers_down == 0),
            Self::SpinRight | Self::SpinLeft => 0,
        }
    }
}

/// Parameters of one movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    /// Driven part.
    pub part: BodyPart,
    /// Number of movements, used when `duration` is zero.
    pub count: u8,
    /// Duration in seconds, zero to use `count`.
    pub duration: f32,
    /// Motor PWM.
    pub speed: u8,
    /// Resting position.
    pub final_state: FinalState,
    /// Only update the PWM.
    pub refresh: bool,
}

impl Movement {
    /// Movement of `count` steps at full speed.
    pub fn count(part: BodyPart, count: u8, final_state: FinalState) -> Self {
        Self {
            part,
            count,
            duration: 0.0,
            speed: SPEED_HIGH,
            final_state,
            refresh: false,
        }
    }

    /// Movement lasting `duration` seconds at full speed.
    pub fn during(part: BodyPart, duration: f32, final_state: FinalState) -> Self {
        Self {
            part,
            count: 0,
            duration,
            speed: SPEED_HIGH,
            final_state,
            refresh: false,
        }
    }

    /// PWM update only.
    pub fn speed(part: BodyPart, speed: u8) -> Self {
        Self {
            part,
            count: 0,
            duration: 0.0,
            speed,
            final_state: FinalState::Undefined,
            refresh: true,
        }
    }
}

/// Frames realizing a movement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementPlan {
    /// Single move sent instead of a counted movement.
    pub single: Option<Frame>,
    /// PWM configuration followed by the motor command, or PWM only.
    pub frames: HVec<Frame, 2>,
}

/// Adjust a movement count so that the part rests in `final_state`.
///
/// `condition` is 2 when fully open, 1 when closed, 0 otherwise. A count
/// landing on the wrong side gets one more movement; at 255 one movement
/// is removed instead.
pub fn parity_correction(final_state: FinalState, value: u8, condition: u8) -> u8 {
    let even = value % 2 == 0;
    let wrong_side = matches!(
        (condition, final_state, even),
        (2, FinalState::OpenUp, true)
            | (1, FinalState::CloseDown, false)
            | (0, FinalState::CloseDown, true)
            | (0, FinalState::OpenUp, false)
    );
    match (wrong_side, value.checked_add(1)) {
        (false, _) => value,
        (true, Some(next)) => next,
        (true, None) => value - 1,
    }
}

/// Plan the frames of a movement, given the part's current `condition`.
pub fn plan(movement: &Movement, condition: u8) -> MovementPlan {
    let part = movement.part;
    let mut plan = MovementPlan::default();
    let mut final_state = movement.final_state;
    if part.is_spin() && final_state != FinalState::Stop {
        final_state = FinalState::Undefined;
    }

    let config = [MOTORS_CONFIG, part as u8, movement.speed, 0];
    if movement.refresh {
        let _ = plan.frames.push(config);
        return plan;
    }

    let mut kind = 0u8;
    let value = if movement.duration == 0.0 {
        control_final_state(part, final_state, movement.count, condition, &mut plan)
    } else if movement.duration < SHORT_MOVEMENT_LIMIT {
        kind = 1;
        // a negative duration saturates to 0
        (movement.duration / FW_MAIN_LOOP_DELAY) as u8
    } else {
        let steps = (movement.duration / part.move_time()).min(255.0) as u8;
        control_final_state(part, final_state, steps, condition, &mut plan)
    };

    if value != 0 || final_state == FinalState::Undefined {
        let _ = plan.frames.push(config);
        let _ = plan.frames.push([MOTORS_SET, part as u8, value, kind]);
    }
    plan
}

fn control_final_state(
    part: BodyPart,
    final_state: FinalState,
    value: u8,
    condition: u8,
    plan: &mut MovementPlan,
) -> u8 {
    if part.is_spin() {
        if value == 0 && final_state == FinalState::Stop {
            plan.single = part.single_move(final_state);
        }
        return value;
    }
    if value != 0 {
        parity_correction(final_state, value, condition)
    } else {
        if final_state != FinalState::Undefined {
            plan.single = part.single_move(final_state);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Parity ─────────────────────────────────────────────────────

    #[test]
    fn open_side_even_count_gets_one_more() {
        assert_eq!(parity_correction(FinalState::OpenUp, 4, 2), 5);
        assert_eq!(parity_correction(FinalState::OpenUp, 3, 2), 3);
    }

    #[test]
    fn closed_side_odd_count_gets_one_more() {
        assert_eq!(parity_correction(FinalState::CloseDown, 3, 1), 4);
        assert_eq!(parity_correction(FinalState::CloseDown, 4, 1), 4);
    }

    #[test]
    fn undetermined_side() {
        assert_eq!(parity_correction(FinalState::CloseDown, 2, 0), 3);
        assert_eq!(parity_correction(FinalState::OpenUp, 3, 0), 4);
        assert_eq!(parity_correction(FinalState::Undefined, 3, 0), 3);
        assert_eq!(parity_correction(FinalState::Stop, 2, 0), 2);
    }

    #[test]
    fn correction_never_overflows() {
        assert_eq!(parity_correction(FinalState::OpenUp, 255, 0), 254);
    }

    // ─── Planning ───────────────────────────────────────────────────

    #[test]
    fn refresh_sends_pwm_only() {
        let p = plan(&Movement::speed(BodyPart::Flippers, 3), 0);
        assert_eq!(p.frames.as_slice(), &[[MOTORS_CONFIG, 2, 3, 0]]);
        assert_eq!(p.single, None);
    }

    #[test]
    fn counted_movement_sends_config_and_set() {
        let p = plan(&Movement::count(BodyPart::Eyes, 4, FinalState::Undefined), 1);
        assert_eq!(
            p.frames.as_slice(),
            &[[MOTORS_CONFIG, 0, 5, 0], [MOTORS_SET, 0, 4, 0]]
        );
    }

    #[test]
    fn zero_count_with_final_state_is_single_move() {
        let p = plan(&Movement::count(BodyPart::Mouth, 0, FinalState::OpenUp), 0);
        assert_eq!(p.single, Some([MOUTH_OPEN, 0, 0, 0]));
        assert!(p.frames.is_empty());

        let p = plan(&Movement::count(BodyPart::Flippers, 0, FinalState::CloseDown), 1);
        assert_eq!(p.single, Some([FLIPPERS_LOWER, 0, 0, 0]));
    }

    #[test]
    fn zero_count_without_final_state_is_endless() {
        let p = plan(&Movement::count(BodyPart::Eyes, 0, FinalState::Undefined), 0);
        assert_eq!(p.frames[1], [MOTORS_SET, 0, 0, 0]);
    }

    #[test]
    fn short_duration_is_raw_time_and_ignores_final_state() {
        let p = plan(&Movement::during(BodyPart::Eyes, 0.2, FinalState::OpenUp), 1);
        assert_eq!(p.frames[1], [MOTORS_SET, 0, 50, 1]);
        assert_eq!(p.single, None);
    }

    #[test]
    fn long_duration_converts_to_steps() {
        // 1.0 s of mouth = 4 movements, closed and asked to close: even stays
        let p = plan(&Movement::during(BodyPart::Mouth, 1.0, FinalState::CloseDown), 1);
        assert_eq!(p.frames[1], [MOTORS_SET, 1, 4, 0]);

        let p = plan(&Movement::during(BodyPart::Flippers, 200.0, FinalState::Undefined), 0);
        assert_eq!(p.frames[1], [MOTORS_SET, 2, 255, 0]);
    }

    #[test]
    fn spin_ignores_open_close() {
        let p = plan(&Movement::count(BodyPart::SpinLeft, 0, FinalState::OpenUp), 0);
        assert_eq!(p.single, None);
        assert_eq!(p.frames[1], [MOTORS_SET, 4, 0, 0]);

        let p = plan(&Movement::count(BodyPart::SpinRight, 0, FinalState::Stop), 0);
        assert_eq!(p.single, Some([SPIN_STOP, 0, 0, 0]));
        assert!(p.frames.is_empty());

        let p = plan(&Movement::count(BodyPart::SpinRight, 3, FinalState::Stop), 0);
        assert_eq!(p.frames[1], [MOTORS_SET, 3, 3, 0]);
    }

    #[test]
    fn condition_reads_switches() {
        let mut hw = HwStatus::new();
        assert_eq!(BodyPart::Flippers.condition(&hw), 1);
        hw.update(&[0xC0, 0x08, 0x00, 0x40]);
        hw.update(&[0xC4, 0, 1, 0]);
        assert_eq!(BodyPart::Eyes.condition(&hw), 1);
        assert_eq!(BodyPart::Mouth.condition(&hw), 1);
        assert_eq!(BodyPart::Flippers.condition(&hw), 0);
    }
}
