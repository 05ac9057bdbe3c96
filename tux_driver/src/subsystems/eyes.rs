//! Eyes.

use tux_common::protocol::command::{
    ActuatorCommand, Command, CommandCategory, FinalState, TuxCommand,
};
use tux_common::protocol::opcodes::EYES_BLINK;
use tux_common::protocol::registers::{Motors, PortD};
use tux_common::status::StatusId;

use crate::context::DriverContext;
use crate::hw_status::HwStatus;
use crate::movements::BodyPart;

/// Command stopping an eyes or mouth movement in `final_state`.
pub fn actuator_stop(final_state: FinalState) -> ActuatorCommand {
    match final_state {
        FinalState::OpenUp => ActuatorCommand::Open,
        FinalState::CloseDown => ActuatorCommand::Close,
        FinalState::Undefined | FinalState::Stop => ActuatorCommand::Off,
    }
}

/// Position name from the open and closed switches. The switches are
/// active low.
pub fn switch_position(open_switch: bool, closed_switch: bool) -> &'static str {
    if !open_switch {
        "OPEN"
    } else if !closed_switch {
        "CLOSE"
    } else {
        "NDEF"
    }
}

impl DriverContext {
    pub(crate) fn update_eyes_position(&self, hw: &HwStatus) {
        let portd = hw.ports().portd;
        self.publish_str(
            StatusId::EyesPosition,
            switch_position(
                portd.contains(PortD::EYES_OPEN_SWITCH),
                portd.contains(PortD::EYES_CLOSED_SWITCH),
            ),
        );
    }

    pub(crate) fn update_eyes_remaining(&self, hw: &HwStatus) {
        self.publish_u8(StatusId::EyesRemainingMovements, hw.position1().eyes_remaining);
    }

    pub(crate) fn update_eyes_motor(&self, hw: &HwStatus) {
        let motors = hw.position2().motors;
        self.publish_bool(
            StatusId::EyesMotorOn,
            motors.contains(Motors::EYES_ON),
        );
    }

    /// Stop the eyes.
    pub fn eyes_off(&self) -> bool {
        self.movement_off(
            BodyPart::Eyes,
            StatusId::EyesRemainingMovements,
            CommandCategory::Eyes,
        )
    }

    pub(crate) fn execute_eyes(&self, command: &ActuatorCommand) -> bool {
        match *command {
            ActuatorCommand::On { count, final_state } => {
                self.movement_count(BodyPart::Eyes, count, final_state)
            }
            ActuatorCommand::OnDuring {
                duration,
                final_state,
            } => self.movement_during(
                BodyPart::Eyes,
                duration,
                final_state,
                [EYES_BLINK, 0, 0, 0],
                StatusId::EyesRemainingMovements,
                Command::Tux(TuxCommand::Eyes(actuator_stop(final_state))),
            ),
            ActuatorCommand::Open => self.movement_to(BodyPart::Eyes, FinalState::OpenUp),
            ActuatorCommand::Close => self.movement_to(BodyPart::Eyes, FinalState::CloseDown),
            ActuatorCommand::Off => self.eyes_off(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_are_active_low() {
        assert_eq!(switch_position(false, true), "OPEN");
        assert_eq!(switch_position(true, false), "CLOSE");
        assert_eq!(switch_position(true, true), "NDEF");
    }

    #[test]
    fn stop_commands_follow_final_state() {
        assert_eq!(actuator_stop(FinalState::OpenUp), ActuatorCommand::Open);
        assert_eq!(actuator_stop(FinalState::CloseDown), ActuatorCommand::Close);
        assert_eq!(actuator_stop(FinalState::Undefined), ActuatorCommand::Off);
        assert_eq!(actuator_stop(FinalState::Stop), ActuatorCommand::Off);
    }
}
