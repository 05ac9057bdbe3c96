//! LEDs: intensity, pulses, transition effects and state reporting.
//!
//! The robot fades between intensities by moving `step` units every `delay`
//! firmware loops. Effects translate a transition duration or a gradient
//! into that pair, per LED when both sides move by different amounts.

use heapless::Vec as HVec;
use tux_common::consts::FW_MAIN_LOOP_DELAY;
use tux_common::protocol::command::{EffectType, LedCommand, LedEffect, Leds};
use tux_common::protocol::frame::Frame;
use tux_common::protocol::opcodes::{LED_FADE_SPEED, LED_PULSE, LED_PULSE_RANGE, LED_SET};
use tux_common::protocol::registers::LedEffectStatus;
use tux_common::status::StatusId;

use crate::context::DriverContext;
use crate::hw_status::HwStatus;

/// Intensity below which a LED reads as off.
const LED_ON_THRESHOLD: u8 = 50;

/// Default effect speed when none is given.
const DEFAULT_EFFECT_SPEED: f32 = 0.1;

/// Fade configuration last sent to the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedFading {
    /// Firmware loops between two steps.
    pub delay: u8,
    /// Intensity units per step.
    pub step: u8,
}

impl Default for LedFading {
    fn default() -> Self {
        Self { delay: 1, step: 1 }
    }
}

/// Intensity byte of a `0.0..=1.0` level.
pub fn intensity_byte(level: f32) -> u8 {
    (255.0 * level).trunc().clamp(0.0, 255.0) as u8
}

fn fade_frame(leds: Leds, fading: LedFading) -> Frame {
    [LED_FADE_SPEED, leds.bits(), fading.delay, fading.step]
}

fn side_deltas(leds: Leds, left: u8, right: u8) -> [(Leds, u8); 2] {
    let pick = |side: Leds, delta: u8| if leds.contains(side) { delta } else { 0 };
    [(Leds::LEFT, pick(Leds::LEFT, left)), (Leds::RIGHT, pick(Leds::RIGHT, right))]
}

impl LedFading {
    /// Fading spread over `duration` seconds per intensity unit.
    pub fn fading(duration: f32) -> Self {
        let loops = (duration / FW_MAIN_LOOP_DELAY) as i32;
        if loops <= 0 {
            Self { delay: 1, step: 0xFF }
        } else if loops > 255 {
            Self { delay: 255, step: 1 }
        } else {
            Self {
                delay: loops as u8,
                step: 1,
            }
        }
    }

    /// Gradient of `delta` units every `duration` seconds.
    pub fn gradient(delta: i32, duration: f32) -> Self {
        let delay = (duration / FW_MAIN_LOOP_DELAY).round().clamp(1.0, 255.0) as u8;
        Self {
            delay,
            step: delta.clamp(1, 255) as u8,
        }
    }

    /// Frames configuring `effect` on `leds`.
    ///
    /// `left` and `right` are the intensity changes the effect will span.
    pub fn effect_frames(
        &mut self,
        leds: Leds,
        effect: &LedEffect,
        left: u8,
        right: u8,
    ) -> HVec<Frame, 2> {
        let mut frames = HVec::new();
        let mut push = |state: &mut Self, target: Leds, fading: LedFading| {
            *state = fading;
            let _ = frames.push(fade_frame(target, fading));
        };
        let speed = if effect.speed <= 0.0 {
            DEFAULT_EFFECT_SPEED
        } else {
            effect.speed
        };

        match effect.kind {
            EffectType::Unaffected => {}
            EffectType::Last => {
                let current = *self;
                push(self, leds, current);
            }
            EffectType::None => push(self, leds, Self { delay: 1, step: 0xFF }),
            EffectType::Default => push(self, leds, Self::default()),
            EffectType::FadeDuration => {
                for (side, delta) in side_deltas(leds, left, right) {
                    if delta != 0 {
                        push(self, side, Self::fading(speed / f32::from(delta)));
                    }
                }
            }
            EffectType::FadeRate => push(self, leds, Self::fading(effect.speed / 255.0)),
            EffectType::GradientNbr => {
                let steps = effect.step.max(1);
                for (side, delta) in side_deltas(leds, left, right) {
                    if delta != 0 {
                        let per_step = (delta / steps).max(1);
                        push(
                            self,
                            side,
                            Self::gradient(i32::from(per_step), speed / f32::from(steps)),
                        );
                    }
                }
            }
            EffectType::GradientDelta => {
                for (side, delta) in side_deltas(leds, left, right) {
                    if delta != 0 {
                        let duration = effect.speed * f32::from(effect.step) / f32::from(delta);
                        push(self, side, Self::gradient(i32::from(effect.step), duration));
                    }
                }
            }
        }
        frames
    }
}

/// Half-period of a pulse in firmware loops.
pub fn pulse_width(period: f32) -> u8 {
    (period / FW_MAIN_LOOP_DELAY / 2.0).round().clamp(1.0, 255.0) as u8
}

/// State name of one LED.
pub fn led_state(intensity: u8, changing: bool) -> &'static str {
    if changing {
        "CHANGING"
    } else if intensity < LED_ON_THRESHOLD {
        "OFF"
    } else {
        "ON"
    }
}

impl DriverContext {
    pub(crate) fn update_leds(&self, hw: &HwStatus) {
        let led = hw.led();
        let effects = led.effect_status;
        let left_changing =
            effects.intersects(LedEffectStatus::LEFT_FADING | LedEffectStatus::LEFT_PULSING);
        let right_changing =
            effects.intersects(LedEffectStatus::RIGHT_FADING | LedEffectStatus::RIGHT_PULSING);
        self.publish_str(StatusId::LeftLedState, led_state(led.left_intensity, left_changing));
        self.publish_str(StatusId::RightLedState, led_state(led.right_intensity, right_changing));
    }

    /// Set `leds` to `level` through `effect`.
    pub(crate) fn led_set(&self, leds: Leds, level: f32, effect: &LedEffect) -> bool {
        let target = intensity_byte(level);
        let led = self.hw_snapshot().led();
        let frames = self.leds.lock().effect_frames(
            leds,
            effect,
            target.abs_diff(led.left_intensity),
            target.abs_diff(led.right_intensity),
        );
        let mut ok = true;
        for frame in &frames {
            ok &= self.send_to_tux(frame);
        }
        ok && self.send_to_tux(&[LED_SET, leds.bits(), target, 0])
    }

    /// Pulse `leds` `count` times between two levels.
    pub(crate) fn led_pulse(
        &self,
        leds: Leds,
        min_level: f32,
        max_level: f32,
        count: u8,
        period: f32,
        effect: &LedEffect,
    ) -> bool {
        let (mut low, mut high) = (intensity_byte(min_level), intensity_byte(max_level));
        if low > high {
            std::mem::swap(&mut low, &mut high);
        }
        let delta = high - low;
        let frames = self.leds.lock().effect_frames(leds, effect, delta, delta);
        let mut ok = true;
        for frame in &frames {
            ok &= self.send_to_tux(frame);
        }
        ok && self.send_to_tux(&[LED_PULSE_RANGE, leds.bits(), high, low])
            && self.send_to_tux(&[LED_PULSE, leds.bits(), count.max(1), pulse_width(period)])
    }

    pub(crate) fn execute_led(&self, command: &LedCommand) -> bool {
        match *command {
            LedCommand::On { leds, intensity } => self.led_set(leds, intensity, &LedEffect::NONE),
            LedCommand::Off { leds } => self.led_set(leds, 0.0, &LedEffect::NONE),
            LedCommand::Set {
                leds,
                intensity,
                effect,
            } => self.led_set(leds, intensity, &effect),
            LedCommand::Pulse {
                leds,
                min_intensity,
                max_intensity,
                count,
                period,
                effect,
            } => self.led_pulse(leds, min_intensity, max_intensity, count, period, &effect),
            LedCommand::Blink {
                leds,
                count,
                period,
            } => self.led_pulse(leds, 0.0, 1.0, count, period, &LedEffect::NONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(kind: EffectType, speed: f32, step: u8) -> LedEffect {
        LedEffect { kind, speed, step }
    }

    // ─── Conversions ────────────────────────────────────────────────

    #[test]
    fn intensity_is_truncated_and_clamped() {
        assert_eq!(intensity_byte(1.0), 255);
        assert_eq!(intensity_byte(0.5), 127);
        assert_eq!(intensity_byte(-1.0), 0);
        assert_eq!(intensity_byte(3.0), 255);
    }

    #[test]
    fn fading_bounds() {
        assert_eq!(LedFading::fading(0.0), LedFading { delay: 1, step: 0xFF });
        assert_eq!(LedFading::fading(0.041), LedFading { delay: 10, step: 1 });
        assert_eq!(LedFading::fading(5.0), LedFading { delay: 255, step: 1 });
    }

    #[test]
    fn gradient_bounds() {
        assert_eq!(LedFading::gradient(0, 0.0), LedFading { delay: 1, step: 1 });
        assert_eq!(LedFading::gradient(300, 0.02), LedFading { delay: 5, step: 255 });
    }

    #[test]
    fn pulse_width_is_half_period() {
        assert_eq!(pulse_width(1.0), 125);
        assert_eq!(pulse_width(0.0), 1);
        assert_eq!(pulse_width(10.0), 255);
    }

    // ─── Effects ────────────────────────────────────────────────────

    #[test]
    fn none_and_default_effects() {
        let mut fading = LedFading::default();
        let frames = fading.effect_frames(Leds::BOTH, &LedEffect::NONE, 10, 10);
        assert_eq!(frames.as_slice(), &[[LED_FADE_SPEED, 3, 1, 0xFF]]);
        let frames = fading.effect_frames(Leds::LEFT, &effect(EffectType::Last, 0.0, 0), 0, 0);
        assert_eq!(frames.as_slice(), &[[LED_FADE_SPEED, 1, 1, 0xFF]]);
        let frames = fading.effect_frames(Leds::LEFT, &effect(EffectType::Default, 0.0, 0), 0, 0);
        assert_eq!(frames.as_slice(), &[[LED_FADE_SPEED, 1, 1, 1]]);
    }

    #[test]
    fn unaffected_sends_nothing() {
        let mut fading = LedFading::default();
        let frames = fading.effect_frames(Leds::BOTH, &effect(EffectType::Unaffected, 1.0, 1), 9, 9);
        assert!(frames.is_empty());
    }

    #[test]
    fn fade_duration_per_side() {
        let mut fading = LedFading::default();
        // 1 s over 250 units: 0.004 s per unit
        let frames =
            fading.effect_frames(Leds::BOTH, &effect(EffectType::FadeDuration, 1.0, 0), 250, 0);
        assert_eq!(frames.as_slice(), &[[LED_FADE_SPEED, 1, 1, 1]]);
    }

    #[test]
    fn gradient_number_splits_delta() {
        let mut fading = LedFading::default();
        let frames =
            fading.effect_frames(Leds::RIGHT, &effect(EffectType::GradientNbr, 0.4, 4), 200, 200);
        // 200 / 4 = 50 units every 0.1 s
        assert_eq!(frames.as_slice(), &[[LED_FADE_SPEED, 2, 25, 50]]);
    }

    // ─── State ──────────────────────────────────────────────────────

    #[test]
    fn led_states() {
        assert_eq!(led_state(49, false), "OFF");
        assert_eq!(led_state(50, false), "ON");
        assert_eq!(led_state(0, true), "CHANGING");
    }
}
