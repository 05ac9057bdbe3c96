//! Mouth.

use tux_common::protocol::command::{
    ActuatorCommand, Command, CommandCategory, FinalState, TuxCommand,
};
use tux_common::protocol::opcodes::MOUTH_MOVE;
use tux_common::protocol::registers::{Motors, PortB};
use tux_common::status::StatusId;

use super::eyes::{actuator_stop, switch_position};
use crate::context::DriverContext;
use crate::hw_status::HwStatus;
use crate::movements::BodyPart;

impl DriverContext {
    pub(crate) fn update_mouth_position(&self, hw: &HwStatus) {
        let portb = hw.ports().portb;
        self.publish_str(
            StatusId::MouthPosition,
            switch_position(
                portb.contains(PortB::MOUTH_OPEN_SWITCH),
                portb.contains(PortB::MOUTH_CLOSED_SWITCH),
            ),
        );
    }

    pub(crate) fn update_mouth_remaining(&self, hw: &HwStatus) {
        self.publish_u8(StatusId::MouthRemainingMovements, hw.position1().mouth_remaining);
    }

    pub(crate) fn update_mouth_motor(&self, hw: &HwStatus) {
        self.publish_bool(
            StatusId::MouthMotorOn,
            hw.position2().motors.contains(Motors::MOUTH_ON),
        );
    }

    /// Stop the mouth.
    pub fn mouth_off(&self) -> bool {
        self.movement_off(
            BodyPart::Mouth,
            StatusId::MouthRemainingMovements,
            CommandCategory::Mouth,
        )
    }

    pub(crate) fn execute_mouth(&self, command: &ActuatorCommand) -> bool {
        match *command {
            ActuatorCommand::On { count, final_state } => {
                self.movement_count(BodyPart::Mouth, count, final_state)
            }
            ActuatorCommand::OnDuring {
                duration,
                final_state,
            } => self.movement_during(
                BodyPart::Mouth,
                duration,
                final_state,
                [MOUTH_MOVE, 0, 0, 0],
                StatusId::MouthRemainingMovements,
                Command::Tux(TuxCommand::Mouth(actuator_stop(final_state))),
            ),
            ActuatorCommand::Open => self.movement_to(BodyPart::Mouth, FinalState::OpenUp),
            ActuatorCommand::Close => self.movement_to(BodyPart::Mouth, FinalState::CloseDown),
            ActuatorCommand::Off => self.mouth_off(),
        }
    }
}
