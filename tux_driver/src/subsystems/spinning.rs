//! Spin motor.

use tux_common::protocol::command::{
    Command, CommandCategory, FinalState, SpinningCommand, TuxCommand,
};
use tux_common::protocol::opcodes::{SPIN_LEFT, SPIN_RIGHT};
use tux_common::protocol::registers::Motors;
use tux_common::status::StatusId;

use crate::context::DriverContext;
use crate::hw_status::HwStatus;
use crate::movements::{BodyPart, Movement, SPEED_HIGH};

/// Spin direction from the motor flags.
pub fn spin_direction(motors: Motors) -> &'static str {
    if motors.contains(Motors::SPIN_LEFT_ON) {
        "LEFT"
    } else if motors.contains(Motors::SPIN_RIGHT_ON) {
        "RIGHT"
    } else {
        "NONE"
    }
}

impl DriverContext {
    pub(crate) fn update_spinning_direction(&self, hw: &HwStatus) {
        self.publish_str(
            StatusId::SpinningDirection,
            spin_direction(hw.position2().motors),
        );
    }

    pub(crate) fn update_spinning_remaining(&self, hw: &HwStatus) {
        self.publish_u8(
            StatusId::SpinningRemainingMovements,
            hw.position2().spin_remaining,
        );
    }

    pub(crate) fn update_spin_motors(&self, hw: &HwStatus) {
        let motors = hw.position2().motors;
        self.publish_bool(StatusId::SpinLeftMotorOn, motors.contains(Motors::SPIN_LEFT_ON));
        self.publish_bool(StatusId::SpinRightMotorOn, motors.contains(Motors::SPIN_RIGHT_ON));
    }

    /// Stop the spin motor.
    pub fn spinning_off(&self) -> bool {
        self.movement_off(
            BodyPart::SpinRight,
            StatusId::SpinningRemainingMovements,
            CommandCategory::Spinning,
        )
    }

    fn spin_during(&self, part: BodyPart, duration: f32) -> bool {
        let opcode = if part == BodyPart::SpinLeft {
            SPIN_LEFT
        } else {
            SPIN_RIGHT
        };
        self.movement_during(
            part,
            duration,
            FinalState::Undefined,
            [opcode, 0, SPEED_HIGH, 0],
            StatusId::SpinningRemainingMovements,
            Command::Tux(TuxCommand::Spinning(SpinningCommand::Off)),
        )
    }

    pub(crate) fn execute_spinning(&self, command: &SpinningCommand) -> bool {
        match *command {
            SpinningCommand::LeftOn(count) => {
                self.movement_count(BodyPart::SpinLeft, count, FinalState::Undefined)
            }
            SpinningCommand::RightOn(count) => {
                self.movement_count(BodyPart::SpinRight, count, FinalState::Undefined)
            }
            SpinningCommand::LeftOnDuring(duration) => self.spin_during(BodyPart::SpinLeft, duration),
            SpinningCommand::RightOnDuring(duration) => {
                self.spin_during(BodyPart::SpinRight, duration)
            }
            SpinningCommand::Off => self.spinning_off(),
            SpinningCommand::Speed(speed) => {
                self.perform_movement(&Movement::speed(BodyPart::SpinRight, speed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_from_motor_flags() {
        assert_eq!(spin_direction(Motors::empty()), "NONE");
        assert_eq!(spin_direction(Motors::SPIN_LEFT_ON), "LEFT");
        assert_eq!(spin_direction(Motors::SPIN_RIGHT_ON), "RIGHT");
        assert_eq!(spin_direction(Motors::EYES_ON), "NONE");
    }
}
