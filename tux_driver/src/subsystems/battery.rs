//! Battery level, battery state and charger state.

use tux_common::config::BatteryConfig;
use tux_common::protocol::registers::{PortB, Sensors};
use tux_common::status::{StatusId, StatusValue};

use crate::context::DriverContext;
use crate::hw_status::{BatteryBody, HwStatus};

/// Millivolts per ADC unit.
const MV_PER_UNIT: f64 = 7.467;

/// Outcome of one battery measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryReport {
    /// Level moved less than the event delta.
    Quiet {
        /// Level in millivolts.
        level: i32,
    },
    /// Level moved enough to raise events.
    Event {
        /// Level in millivolts.
        level: i32,
        /// Whether the level itself is evented. Measures taken while a motor
        /// runs are not.
        publish_level: bool,
        /// Battery state name.
        state: &'static str,
    },
}

/// Battery level hysteresis.
#[derive(Debug, Clone)]
pub struct BatteryMonitor {
    config: BatteryConfig,
    last_event_level: i32,
}

impl BatteryMonitor {
    /// Monitor with the given cutoffs.
    pub fn new(config: BatteryConfig) -> Self {
        Self {
            config,
            last_event_level: 0,
        }
    }

    /// Battery state name of a level.
    pub fn state_of(&self, level: i32) -> &'static str {
        let level = level as f32;
        if level >= self.config.full_mv {
            "FULL"
        } else if level >= self.config.high_mv {
            "HIGH"
        } else if level >= self.config.low_mv {
            "LOW"
        } else {
            "EMPTY"
        }
    }

    /// Convert a measure to millivolts.
    pub fn level_mv(body: &BatteryBody) -> i32 {
        let raw = (u32::from(body.high_level) << 8) + u32::from(body.low_level);
        (f64::from(raw) * MV_PER_UNIT) as i32
    }

    /// Process one measure.
    pub fn update(&mut self, body: &BatteryBody) -> BatteryReport {
        let level = Self::level_mv(body);
        if ((level - self.last_event_level).abs() as f32) <= self.config.event_delta_mv {
            return BatteryReport::Quiet { level };
        }
        self.last_event_level = level;
        BatteryReport::Event {
            level,
            publish_level: body.motors_state == 0,
            state: self.state_of(level),
        }
    }
}

/// Charger state from the plug switch, the charger LED and the inhibit bit.
pub fn charger_state(hw: &HwStatus) -> &'static str {
    let sensors = hw.sensors1().sensors;
    if !sensors.contains(Sensors::POWER_PLUG_INSERTION_SWITCH) {
        "UNPLUGGED"
    } else if sensors.contains(Sensors::CHARGER_LED_STATUS) {
        "CHARGING"
    } else if hw.ports().portb.contains(PortB::CHARGER_INHIBIT_SIGNAL) {
        "INHIBITED"
    } else {
        "TRICKLE"
    }
}

impl DriverContext {
    pub(crate) fn update_battery_level(&self, hw: &HwStatus) {
        let report = self.battery.lock().update(&hw.battery());
        match report {
            BatteryReport::Quiet { level } => {
                self.store(StatusId::BatteryLevel, StatusValue::Int(level));
            }
            BatteryReport::Event {
                level,
                publish_level,
                state,
            } => {
                if publish_level {
                    self.publish(StatusId::BatteryLevel, StatusValue::Int(level));
                }
                self.publish_str(StatusId::BatteryState, state);
            }
        }
    }

    pub(crate) fn update_charger_state(&self, hw: &HwStatus) {
        self.publish_str(StatusId::ChargerState, charger_state(hw));
    }
}
