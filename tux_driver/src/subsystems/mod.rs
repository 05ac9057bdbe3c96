//! Subsystem updaters and command functions.
//!
//! Each module pairs a small state tracker (pure, unit tested) with an
//! `impl DriverContext` block that feeds it from the hardware snapshot,
//! publishes the resulting statuses and sends the command frames.

pub mod audio;
pub mod battery;
pub mod eyes;
pub mod flippers;
pub mod id;
pub mod leds;
pub mod light;
pub mod mouth;
pub mod pong;
pub mod sound_flash;
pub mod spinning;
pub mod user_inputs;

use tux_common::protocol::command::{Command, CommandCategory, FinalState};
use tux_common::protocol::frame::Frame;
use tux_common::status::StatusId;

use crate::context::DriverContext;
use crate::movements::{self, BodyPart, Movement, SHORT_MOVEMENT_LIMIT};

impl DriverContext {
    /// Send the frames of a movement. Returns whether every frame was written.
    pub(crate) fn perform_movement(&self, movement: &Movement) -> bool {
        let condition = movement.part.condition(&self.hw_snapshot());
        let plan = movements::plan(movement, condition);
        let mut ok = true;
        if let Some(frame) = plan.single {
            ok &= self.send_to_tux(&frame);
        }
        for frame in &plan.frames {
            ok &= self.send_to_tux(frame);
        }
        ok
    }

    /// Timed movement shared by every body part.
    ///
    /// Short durations go through the motor timer. Longer ones start the
    /// continuous movement and schedule `stop` after `duration`.
    pub(crate) fn movement_during(
        &self,
        part: BodyPart,
        duration: f32,
        final_state: FinalState,
        continuous: Frame,
        remaining: StatusId,
        stop: Command,
    ) -> bool {
        if duration < SHORT_MOVEMENT_LIMIT {
            return self.perform_movement(&Movement::during(part, duration, final_state));
        }
        if !self.send_to_tux(&continuous) {
            return false;
        }
        self.publish_u8(remaining, 255);
        self.insert_sys(duration, stop)
    }

    /// Stop a body part, dropping its pending stop commands first.
    pub(crate) fn movement_off(
        &self,
        part: BodyPart,
        remaining: StatusId,
        category: CommandCategory,
    ) -> bool {
        self.clean_sys(category);
        let ok = self.perform_movement(&Movement::count(part, 0, FinalState::Stop));
        self.publish_u8(remaining, 0);
        ok
    }

    /// Single move to a resting position.
    pub(crate) fn movement_to(&self, part: BodyPart, final_state: FinalState) -> bool {
        self.perform_movement(&Movement::count(part, 0, final_state))
    }

    /// Counted movement at full speed.
    pub(crate) fn movement_count(&self, part: BodyPart, count: u8, final_state: FinalState) -> bool {
        self.perform_movement(&Movement::count(part, count, final_state))
    }
}
