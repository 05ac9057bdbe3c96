//! Buttons, remote control and infrared emitter.

use heapless::Vec as HVec;
use tux_common::protocol::command::IrCommand;
use tux_common::protocol::opcodes::{IR_OFF, IR_ON, IR_SEND_RC5};
use tux_common::protocol::registers::{Rc5Code, Sensors};
use tux_common::status::StatusId;

use crate::context::DriverContext;
use crate::hw_status::HwStatus;

/// Value of `remote_button` when no key is held.
pub const RELEASE: &str = "RELEASE";

/// Highest RC5 command mapped to a key.
const LAST_KEY_CODE: u8 = 0x3C;

/// Cycles without an IR frame before a held key is released.
const RELEASE_TIMEOUT_CYCLES: u8 = 2;

/// Name of the remote key sending `command`.
pub fn key_name(command: u8) -> Option<&'static str> {
    let name = match command {
        0x00 => "K_0",
        0x01 => "K_1",
        0x02 => "K_2",
        0x03 => "K_3",
        0x04 => "K_4",
        0x05 => "K_5",
        0x06 => "K_6",
        0x07 => "K_7",
        0x08 => "K_8",
        0x09 => "K_9",
        0x0C => "K_STANDBY",
        0x0D => "K_MUTE",
        0x10 => "K_VOLUMEPLUS",
        0x11 => "K_VOLUMEMINUS",
        0x12 => "K_ESCAPE",
        0x13 => "K_YES",
        0x14 => "K_NO",
        0x15 => "K_BACKSPACE",
        0x16 => "K_STARTVOIP",
        0x17 => "K_RECEIVECALL",
        0x18 => "K_HANGUP",
        0x19 => "K_STAR",
        0x1A => "K_SHARP",
        0x1B => "K_RED",
        0x1C => "K_GREEN",
        0x1D => "K_BLUE",
        0x1E => "K_YELLOW",
        0x20 => "K_CHANNELPLUS",
        0x21 => "K_CHANNELMINUS",
        0x22 => "K_UP",
        0x23 => "K_DOWN",
        0x24 => "K_LEFT",
        0x25 => "K_RIGHT",
        0x26 => "K_OK",
        0x32 => "K_FASTREWIND",
        0x34 => "K_FASTFORWARD",
        0x35 => "K_PLAYPAUSE",
        0x36 => "K_STOP",
        0x37 => "K_RECORDING",
        0x38 => "K_PREVIOUS",
        0x39 => "K_NEXT",
        0x3A => "K_MENU",
        0x3B => "K_MOUSE",
        LAST_KEY_CODE => "K_ALT",
        _ => return None,
    };
    Some(name)
}

/// RC5 key press tracker.
///
/// IR frames only mark reception; the tracker runs once per cycle and
/// decides between a new key, a held key and a release from the toggle bit.
#[derive(Debug, Clone)]
pub struct RemoteControl {
    ir_received: bool,
    first_use: bool,
    timeout_counter: u8,
    receiving: bool,
    last_toggle: bool,
}

impl Default for RemoteControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteControl {
    /// Idle tracker.
    pub fn new() -> Self {
        Self {
            ir_received: false,
            first_use: true,
            timeout_counter: 0,
            receiving: false,
            last_toggle: false,
        }
    }

    /// Back to idle.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// An IR frame arrived during this cycle.
    pub fn mark_received(&mut self) {
        self.ir_received = true;
    }

    /// Run one cycle with the last RC5 code. Returns the values to publish
    /// on `remote_button`, in order.
    pub fn update(&mut self, code: Rc5Code) -> HVec<&'static str, 2> {
        let mut events = HVec::new();
        let toggled = code.toggle != self.last_toggle;
        if self.receiving {
            if !self.ir_received {
                self.timeout_counter += 1;
                if self.timeout_counter >= RELEASE_TIMEOUT_CYCLES {
                    let _ = events.push(RELEASE);
                    self.timeout_counter = 0;
                    self.receiving = false;
                }
            } else {
                self.timeout_counter = 0;
                if toggled {
                    let _ = events.push(RELEASE);
                    match key_name(code.command) {
                        Some(key) => {
                            let _ = events.push(key);
                        }
                        None => self.receiving = false,
                    }
                }
            }
        } else if self.ir_received && (toggled || self.first_use) {
            self.first_use = false;
            self.timeout_counter = 0;
            match key_name(code.command) {
                Some(key) => {
                    self.receiving = true;
                    let _ = events.push(key);
                }
                None => self.receiving = false,
            }
        }
        self.last_toggle = code.toggle;
        self.ir_received = false;
        events
    }
}

impl DriverContext {
    pub(crate) fn update_buttons(&self, hw: &HwStatus) {
        let sensors = hw.sensors1().sensors;
        self.publish_bool(
            StatusId::LeftWingButton,
            sensors.contains(Sensors::LEFT_WING_PUSH_BUTTON),
        );
        self.publish_bool(
            StatusId::RightWingButton,
            sensors.contains(Sensors::RIGHT_WING_PUSH_BUTTON),
        );
        self.publish_bool(StatusId::HeadButton, sensors.contains(Sensors::HEAD_PUSH_BUTTON));
    }

    pub(crate) fn update_remote(&self) {
        let code = self.hw_snapshot().ir();
        let events = self.remote.lock().update(code);
        for value in events {
            self.publish_str(StatusId::RemoteButton, value);
        }
    }

    pub(crate) fn execute_ir(&self, command: &IrCommand) -> bool {
        match *command {
            IrCommand::On => self.send_to_tux(&[IR_ON, 0, 0, 0]),
            IrCommand::Off => self.send_to_tux(&[IR_OFF, 0, 0, 0]),
            IrCommand::Send { address, command } => {
                self.send_to_tux(&[IR_SEND_RC5, address, command, 0])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(command: u8, toggle: bool) -> Rc5Code {
        Rc5Code {
            command,
            toggle,
            received: true,
        }
    }

    fn press(remote: &mut RemoteControl, c: Rc5Code) -> Vec<&'static str> {
        remote.mark_received();
        remote.update(c).into_iter().collect()
    }

    // ─── Key names ──────────────────────────────────────────────────

    #[test]
    fn key_table() {
        assert_eq!(key_name(0), Some("K_0"));
        assert_eq!(key_name(0x26), Some("K_OK"));
        assert_eq!(key_name(0x3C), Some("K_ALT"));
        assert_eq!(key_name(0x0A), None);
        assert_eq!(key_name(0x3D), None);
    }

    // ─── Tracking ───────────────────────────────────────────────────

    #[test]
    fn first_press_is_reported_then_released() {
        let mut remote = RemoteControl::new();
        assert_eq!(press(&mut remote, code(0x26, false)), vec!["K_OK"]);
        // held: same toggle
        assert_eq!(press(&mut remote, code(0x26, false)), Vec::<&str>::new());
        assert!(remote.update(code(0x26, false)).is_empty());
        assert_eq!(remote.update(code(0x26, false)).as_slice(), &[RELEASE]);
    }

    #[test]
    fn new_toggle_while_held_releases_then_presses() {
        let mut remote = RemoteControl::new();
        press(&mut remote, code(0x01, false));
        assert_eq!(press(&mut remote, code(0x02, true)), vec![RELEASE, "K_2"]);
    }

    #[test]
    fn repeated_toggle_after_release_needs_a_flip() {
        let mut remote = RemoteControl::new();
        press(&mut remote, code(0x01, true));
        remote.update(code(0x01, true));
        remote.update(code(0x01, true));
        assert!(press(&mut remote, code(0x01, true)).is_empty());
        assert_eq!(press(&mut remote, code(0x01, false)), vec!["K_1"]);
    }

    #[test]
    fn unknown_code_stops_reception() {
        let mut remote = RemoteControl::new();
        assert!(press(&mut remote, code(0x3F, false)).is_empty());
        assert!(!remote.receiving);
        assert_eq!(press(&mut remote, code(0x01, true)), vec!["K_1"]);
        assert_eq!(press(&mut remote, code(0x3F, false)), vec![RELEASE]);
        assert!(!remote.receiving);
    }
}
