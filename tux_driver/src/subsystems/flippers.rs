//! Flippers.

use tux_common::protocol::command::{
    Command, CommandCategory, FinalState, FlippersCommand, TuxCommand,
};
use tux_common::protocol::opcodes::FLIPPERS_WAVE;
use tux_common::protocol::registers::Motors;
use tux_common::status::StatusId;

use crate::context::DriverContext;
use crate::hw_status::HwStatus;
use crate::movements::{BodyPart, Movement, SPEED_HIGH};

/// Command stopping a flippers movement in `final_state`.
pub fn flippers_stop(final_state: FinalState) -> FlippersCommand {
    match final_state {
        FinalState::OpenUp => FlippersCommand::Up,
        FinalState::CloseDown => FlippersCommand::Down,
        FinalState::Undefined | FinalState::Stop => FlippersCommand::Off,
    }
}

impl DriverContext {
    pub(crate) fn update_flippers_position(&self, hw: &HwStatus) {
        let position = if hw.position2().flippers_down == 0 {
            "DOWN"
        } else {
            "UP"
        };
        self.publish_str(StatusId::FlippersPosition, position);
    }

    pub(crate) fn update_flippers_remaining(&self, hw: &HwStatus) {
        self.publish_u8(
            StatusId::FlippersRemainingMovements,
            hw.position1().flippers_remaining,
        );
    }

    pub(crate) fn update_flippers_motor(&self, hw: &HwStatus) {
        self.publish_bool(
            StatusId::FlippersMotorOn,
            hw.position2().motors.contains(Motors::FLIPPERS_ON),
        );
    }

    /// Stop the flippers.
    pub fn flippers_off(&self) -> bool {
        self.movement_off(
            BodyPart::Flippers,
            StatusId::FlippersRemainingMovements,
            CommandCategory::Flippers,
        )
    }

    pub(crate) fn execute_flippers(&self, command: &FlippersCommand) -> bool {
        match *command {
            FlippersCommand::On { count, final_state } => {
                self.movement_count(BodyPart::Flippers, count, final_state)
            }
            FlippersCommand::OnDuring {
                duration,
                final_state,
            } => self.movement_during(
                BodyPart::Flippers,
                duration,
                final_state,
                [FLIPPERS_WAVE, 0, SPEED_HIGH, 0],
                StatusId::FlippersRemainingMovements,
                Command::Tux(TuxCommand::Flippers(flippers_stop(final_state))),
            ),
            FlippersCommand::Up => self.movement_to(BodyPart::Flippers, FinalState::OpenUp),
            FlippersCommand::Down => self.movement_to(BodyPart::Flippers, FinalState::CloseDown),
            FlippersCommand::Off => self.flippers_off(),
            FlippersCommand::Speed(speed) => {
                self.perform_movement(&Movement::speed(BodyPart::Flippers, speed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_commands_follow_final_state() {
        assert_eq!(flippers_stop(FinalState::OpenUp), FlippersCommand::Up);
        assert_eq!(flippers_stop(FinalState::CloseDown), FlippersCommand::Down);
        assert_eq!(flippers_stop(FinalState::Stop), FlippersCommand::Off);
    }
}
