//! Command opcodes and routing bytes.
//!
//! An outbound report is a routing byte followed by a 4-byte frame whose
//! first byte is one of the opcodes below.

/// Destination of an outbound report (first report byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Route {
    /// Forwarded over RF to the robot.
    Tux = 0,
    /// Handled by the dongle itself.
    Dongle = 1,
    /// Dongle bootloader.
    Bootloader = 2,
}

// ─── Dongle commands ────────────────────────────────────────────────

/// Dongle connection management.
pub const DONGLE_CONNECTION: u8 = 0x00;
/// Dongle status request / RF control.
pub const DONGLE_STATUS: u8 = 0x01;
/// Dongle audio channel selection.
pub const DONGLE_AUDIO: u8 = 0x02;
/// Dongle firmware version request.
pub const DONGLE_VERSION: u8 = 0x06;

/// Connection sub-command: disconnect from the robot.
pub const CONNECTION_DISCONNECT: u8 = 0x01;
/// Connection sub-command: connect to a robot id.
pub const CONNECTION_CONNECT: u8 = 0x02;
/// Connection sub-command: request the current id.
pub const CONNECTION_ID_REQUEST: u8 = 0x03;
/// Connection sub-command: look up robot ids.
pub const CONNECTION_ID_LOOKUP: u8 = 0x04;
/// Connection sub-command: change the robot id.
pub const CONNECTION_CHANGE_ID: u8 = 0x05;
/// Connection sub-command: wake the robot up.
pub const CONNECTION_WAKEUP: u8 = 0x06;
/// Connection sub-command: select the wireless channel.
pub const CONNECTION_WIRELESS_CHANNEL: u8 = 0x07;

/// Last status-request byte asking for an RF link reset.
pub const STATUS_RESET_RF: u8 = 0xFD;
/// Last status-request byte asking for a full dongle reset.
pub const STATUS_RESET_DONGLE: u8 = 0xFE;

// ─── Eyes ───────────────────────────────────────────────────────────

/// Open the eyes.
pub const EYES_OPEN: u8 = 0x33;
/// Close the eyes.
pub const EYES_CLOSE: u8 = 0x38;
/// Blink continuously.
pub const EYES_BLINK: u8 = 0x40;
/// Stop the eyes motor.
pub const EYES_STOP: u8 = 0x32;

// ─── Mouth ──────────────────────────────────────────────────────────

/// Open the mouth.
pub const MOUTH_OPEN: u8 = 0x34;
/// Close the mouth.
pub const MOUTH_CLOSE: u8 = 0x35;
/// Move the mouth continuously.
pub const MOUTH_MOVE: u8 = 0x41;
/// Stop the mouth motor.
pub const MOUTH_STOP: u8 = 0x36;

// ─── Flippers ───────────────────────────────────────────────────────

/// Raise the flippers.
pub const FLIPPERS_RAISE: u8 = 0x39;
/// Lower the flippers.
pub const FLIPPERS_LOWER: u8 = 0x3A;
/// Wave continuously.
pub const FLIPPERS_WAVE: u8 = 0x80;
/// Stop the flippers motor.
pub const FLIPPERS_STOP: u8 = 0x30;

// ─── Spinning ───────────────────────────────────────────────────────

/// Spin left continuously.
pub const SPIN_LEFT: u8 = 0x83;
/// Spin right continuously.
pub const SPIN_RIGHT: u8 = 0x82;
/// Stop spinning.
pub const SPIN_STOP: u8 = 0x37;

// ─── LEDs ───────────────────────────────────────────────────────────

/// Configure the fading speed.
pub const LED_FADE_SPEED: u8 = 0xD0;
/// Set the intensity.
pub const LED_SET: u8 = 0xD1;
/// Configure the pulse range.
pub const LED_PULSE_RANGE: u8 = 0xD2;
/// Start pulsing.
pub const LED_PULSE: u8 = 0xD3;

// ─── Motors ─────────────────────────────────────────────────────────

/// Ping request used for connection quality.
pub const PING: u8 = 0x7F;
/// Start a counted or timed movement.
pub const MOTORS_SET: u8 = 0xD4;
/// Configure motor PWM.
pub const MOTORS_CONFIG: u8 = 0x81;

// ─── IR ─────────────────────────────────────────────────────────────

/// Enable the IR receiver.
pub const IR_ON: u8 = 0x17;
/// Disable the IR receiver.
pub const IR_OFF: u8 = 0x18;
/// Emit an RC5 code.
pub const IR_SEND_RC5: u8 = 0x91;

// ─── Sound ──────────────────────────────────────────────────────────

/// Play a flash track.
pub const SOUND_PLAY: u8 = 0x90;
/// Start storing a track.
pub const SOUND_STORE: u8 = 0x52;
/// Confirm the stored track.
pub const SOUND_CONFIRM: u8 = 0x53;
/// Erase the sound flash.
pub const SOUND_ERASE: u8 = 0x54;
/// Mute the audio amplifier.
pub const AUDIO_MUTE: u8 = 0x92;

/// Set the wireless frequency boundaries.
pub const WIRELESS_FREQ_BOUNDARIES: u8 = 0x88;

// ─── Fixed frames ───────────────────────────────────────────────────

/// Wake-up frame sent to the robot on connection.
pub const WAKEUP_FRAME: [u8; 4] = [0xB6, 0xFF, 0x01, 0x00];

/// Status request written before every polling read.
pub const STATUS_REQUEST_REPORT: [u8; 5] = [Route::Dongle as u8, DONGLE_STATUS, 0, 0, 0];

/// Report resetting the RF link.
pub const RESET_RF_REPORT: [u8; 5] = [Route::Dongle as u8, DONGLE_STATUS, 0, 0, STATUS_RESET_RF];

/// Report resetting the dongle.
pub const RESET_DONGLE_REPORT: [u8; 5] = [
    Route::Dongle as u8,
    DONGLE_STATUS,
    0,
    0,
    STATUS_RESET_DONGLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_reports() {
        assert_eq!(STATUS_REQUEST_REPORT, [1, 1, 0, 0, 0]);
        assert_eq!(RESET_RF_REPORT, [1, 1, 0, 0, 0xFD]);
        assert_eq!(RESET_DONGLE_REPORT, [1, 1, 0, 0, 0xFE]);
    }
}
