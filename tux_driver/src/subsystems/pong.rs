//! Connection quality from ping/pong exchanges.

use heapless::Deque;
use tux_common::protocol::opcodes::PING;
use tux_common::status::{StatusId, StatusValue};

use crate::context::DriverContext;
use crate::hw_status::HwStatus;

/// Cycles between two ping requests.
pub const PING_PERIOD_CYCLES: u32 = 40;

/// Pongs requested per ping.
pub const PINGS_PER_REQUEST: u8 = 200;

/// Pending count at or below which a measurement window closes.
const PENDING_WINDOW_END: u8 = 190;

const WINDOW_LEN: usize = 10;

/// Sliding average of received pongs.
#[derive(Debug, Clone, Default)]
pub struct PongMonitor {
    received: u32,
    window: Deque<u8, WINDOW_LEN>,
}

impl PongMonitor {
    /// Empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one pong. Returns the new quality when a window closes.
    pub fn update(&mut self, pending: u8) -> Option<i32> {
        self.received += 1;
        if pending > PENDING_WINDOW_END {
            return None;
        }
        let mut quality = None;
        if self.received > 1 {
            if self.window.is_full() {
                self.window.pop_front();
            }
            let sample = (self.received * 10).min(100) as u8;
            let _ = self.window.push_back(sample);
            let sum: u32 = self.window.iter().map(|&q| u32::from(q)).sum();
            quality = Some((sum / self.window.len() as u32) as i32);
        }
        self.received = 0;
        quality
    }
}

impl DriverContext {
    pub(crate) fn update_pong(&self, hw: &HwStatus) {
        let quality = self.pong.lock().update(hw.pong().pending);
        if let Some(quality) = quality {
            self.publish(StatusId::ConnectionQuality, StatusValue::Int(quality));
        }
    }

    pub(crate) fn send_ping(&self) -> bool {
        self.send_to_tux(&[PING, PINGS_PER_REQUEST, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pong_only_resets() {
        let mut monitor = PongMonitor::new();
        assert_eq!(monitor.update(150), None);
        assert_eq!(monitor.update(150), None);
    }

    #[test]
    fn window_averages_samples() {
        let mut monitor = PongMonitor::new();
        for _ in 0..4 {
            assert_eq!(monitor.update(199), None);
        }
        // 5 pongs -> 50
        assert_eq!(monitor.update(180), Some(50));
        for _ in 0..11 {
            monitor.update(199);
        }
        // 12 pongs -> capped at 100, average (50 + 100) / 2
        assert_eq!(monitor.update(180), Some(75));
    }

    #[test]
    fn window_keeps_last_ten() {
        let mut monitor = PongMonitor::new();
        monitor.update(199);
        monitor.update(100);
        for _ in 0..10 {
            for _ in 0..10 {
                monitor.update(199);
            }
            monitor.update(100);
        }
        assert_eq!(monitor.window.len(), WINDOW_LEN);
        assert!(monitor.window.iter().all(|&q| q == 100));
    }
}
