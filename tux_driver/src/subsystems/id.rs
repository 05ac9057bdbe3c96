//! Connection identifier.

use tux_common::protocol::opcodes::{CONNECTION_DISCONNECT, CONNECTION_ID_REQUEST, DONGLE_CONNECTION};

use crate::context::DriverContext;
use crate::hw_status::HwStatus;

impl DriverContext {
    pub(crate) fn update_id(&self, hw: &HwStatus) {
        self.id.lock().number = hw.id_number();
    }

    /// Ask the dongle for the identifier of the connected robot.
    pub(crate) fn request_id(&self) -> bool {
        self.send_to_dongle(&[DONGLE_CONNECTION, CONNECTION_ID_REQUEST, 0, 0])
    }

    /// Drop the radio connection with the robot.
    pub fn disconnect_from_tux(&self) -> bool {
        self.send_to_dongle(&[DONGLE_CONNECTION, CONNECTION_DISCONNECT, 0, 0])
    }
}
