//! Light level.

use tux_common::status::{StatusId, StatusValue};

use crate::context::DriverContext;
use crate::hw_status::{HwStatus, LightBody};

/// Full scale of the light measure.
const LIGHT_FULL_SCALE: i32 = 1128;

/// Light level hysteresis.
#[derive(Debug, Clone, Default)]
pub struct LightMonitor {
    last_event_level: f32,
}

impl LightMonitor {
    /// Monitor starting at 0 %.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a measure to a percentage.
    ///
    /// Mode 0 is the low-gain range, folded above the high-gain one.
    pub fn level(body: &LightBody) -> f32 {
        let mut value = (i32::from(body.high_level) << 8) + i32::from(body.low_level);
        if body.mode == 0 {
            value = value / 8 + 1000;
        }
        (LIGHT_FULL_SCALE - value) as f32 * 100.0 / LIGHT_FULL_SCALE as f32
    }

    /// Process one measure. Returns the level and whether it moved by more
    /// than one point since the last event.
    pub fn update(&mut self, body: &LightBody) -> (f32, bool) {
        let level = Self::level(body);
        if (level - self.last_event_level).abs() > 1.0 {
            self.last_event_level = level;
            (level, true)
        } else {
            (level, false)
        }
    }
}

impl DriverContext {
    pub(crate) fn update_light_level_from(&self, hw: &HwStatus) {
        let (level, event) = self.light.lock().update(&hw.light());
        if event {
            self.publish(StatusId::LightLevel, StatusValue::Float(level));
        } else {
            self.store(StatusId::LightLevel, StatusValue::Float(level));
        }
    }

    /// Recompute the light level from the current snapshot.
    pub fn update_light_level(&self) {
        let hw = self.hw_snapshot();
        self.update_light_level_from(&hw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: u16, mode: u8) -> LightBody {
        LightBody {
            high_level: (raw >> 8) as u8,
            low_level: raw as u8,
            mode,
        }
    }

    #[test]
    fn high_gain_measure() {
        assert_eq!(LightMonitor::level(&body(1128, 1)), 0.0);
        assert_eq!(LightMonitor::level(&body(0, 1)), 100.0);
    }

    #[test]
    fn low_gain_measure_is_folded() {
        // 1024 / 8 + 1000 = 1128
        assert_eq!(LightMonitor::level(&body(1024, 0)), 0.0);
        let dim = LightMonitor::level(&body(0, 0));
        assert!((dim - 128.0 * 100.0 / 1128.0).abs() < 1e-4);
    }

    #[test]
    fn events_need_more_than_one_point() {
        let mut monitor = LightMonitor::new();
        assert_eq!(monitor.update(&body(1128, 1)), (0.0, false));
        let (_, event) = monitor.update(&body(1100, 1));
        assert!(event);
        let (_, event) = monitor.update(&body(1095, 1));
        assert!(!event);
    }
}
