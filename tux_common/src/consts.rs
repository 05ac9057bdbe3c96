//! System-wide constants for the Tux driver workspace.
//!
//! Single source of truth for all numeric limits and wire sizes.
//! Imported by all crates; no duplication permitted.

use static_assertions::const_assert;

/// USB vendor identifier of the Tux Droid dongle.
pub const TUX_VID: u16 = 0x03EB;

/// USB product identifier of the Tux Droid dongle.
pub const TUX_PID: u16 = 0xFF07;

/// Length of one status/command frame (header + 3 payload bytes).
pub const FRAME_LEN: usize = 4;

/// Length of an outbound report (routing byte + frame).
pub const SEND_LEN: usize = 5;

/// Length of an inbound polling report.
pub const RECEIVE_LEN: usize = 64;

/// Offset of the first packed status frame inside a polling report.
pub const REPORT_HEADER_LEN: usize = 4;

/// Maximum number of status frames packed in one polling report.
pub const MAX_FRAMES_PER_REPORT: usize = 15;

/// Number of known status frame categories.
pub const FRAME_CATEGORY_COUNT: usize = 16;

/// Combined receipt count at which the frame counters are dumped and reset.
pub const FRAME_COUNTER_DUMP_THRESHOLD: u32 = 15;

/// Default polling interval in milliseconds (10 Hz).
pub const READ_INTERVAL_MS: u64 = 100;

/// Default delay between two device acquisition attempts.
pub const RECONNECT_DELAY_MS: u64 = 1000;

/// Consecutive empty reports (RF online) before the link is kicked.
pub const EMPTY_FRAME_LIMIT: u32 = 20;

/// Consecutive reports with the same frame id before the RF link is reset.
pub const FROZEN_FRAME_LIMIT: u32 = 10;

/// Capacity of each delayed-command stack.
pub const COMMAND_STACK_CAPACITY: usize = 512;

/// Maximum number of tokens extracted from one command line.
pub const MAX_TOKENS: usize = 32;

/// Maximum length of a single token in bytes.
pub const MAX_TOKEN_LEN: usize = 1024;

/// Maximum length of a macro text in bytes.
pub const MAX_MACRO_LEN: usize = 16384;

/// Firmware main loop period on the robot, in seconds.
pub const FW_MAIN_LOOP_DELAY: f32 = 0.004;

/// Size of a hardware sound-flash block in bytes.
pub const SOUND_BLOCK_SIZE: u64 = 4000;

/// Number of sound-flash blocks available for user sounds.
pub const MAX_SOUND_BLOCKS: u64 = 127;

/// Size of the WAV header skipped when computing the payload size.
pub const WAV_HEADER_LEN: u64 = 44;

/// Default battery FULL cutoff in millivolts.
pub const BATTERY_FULL_MV: f32 = 5000.0;

/// Default battery HIGH cutoff in millivolts.
pub const BATTERY_HIGH_MV: f32 = 4800.0;

/// Default battery LOW cutoff in millivolts.
pub const BATTERY_LOW_MV: f32 = 4650.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tuxdroid/driver.toml";

/// Canonical driver service name (used for logging).
pub const DRIVER_SERVICE_NAME: &str = "tuxdriver";

/// Driver version triple published in the descriptor.
pub const DRIVER_VERSION: (u32, u32, u32) = (0, 0, 6);

const_assert!(SEND_LEN == FRAME_LEN + 1);
const_assert!(REPORT_HEADER_LEN + MAX_FRAMES_PER_REPORT * FRAME_LEN <= RECEIVE_LEN);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(COMMAND_STACK_CAPACITY > 0);
        assert!(MAX_TOKENS > 0 && MAX_TOKENS <= 256);
        assert!(READ_INTERVAL_MS > 0);
        assert!(BATTERY_FULL_MV > BATTERY_HIGH_MV && BATTERY_HIGH_MV > BATTERY_LOW_MV);
    }

    #[test]
    fn report_fits_all_frames() {
        assert_eq!(REPORT_HEADER_LEN + MAX_FRAMES_PER_REPORT * FRAME_LEN, RECEIVE_LEN);
    }
}
