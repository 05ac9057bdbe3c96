//! Typed command model.
//!
//! A textual command such as `TUX_CMD:EYES:ON:3,OPEN` parses into a
//! [`Command`]. Each category has its own sub-command enum carrying exactly
//! the parameters that sub-command needs, so dispatch is an exhaustive match.

use bitflags::bitflags;
use std::fmt;

/// Command category, used to pair system commands with their user command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    /// Audio channel and mute.
    Audio,
    /// Eyes movements.
    Eyes,
    /// Infrared receiver and emitter.
    Ir,
    /// Blue LEDs.
    Led,
    /// Mouth movements.
    Mouth,
    /// Sound flash playback.
    SoundFlash,
    /// Spinning movements.
    Spinning,
    /// Flippers movements.
    Flippers,
}

impl CommandCategory {
    /// Token naming the category in command text.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Audio => "AUDIO",
            Self::Eyes => "EYES",
            Self::Ir => "IR",
            Self::Led => "LED",
            Self::Mouth => "MOUTH",
            Self::SoundFlash => "SOUND_FLASH",
            Self::Spinning => "SPINNING",
            Self::Flippers => "FLIPPERS",
        }
    }

    /// Parse a category token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AUDIO" => Some(Self::Audio),
            "EYES" => Some(Self::Eyes),
            "IR" => Some(Self::Ir),
            "LED" => Some(Self::Led),
            "MOUTH" => Some(Self::Mouth),
            "SOUND_FLASH" => Some(Self::SoundFlash),
            "SPINNING" => Some(Self::Spinning),
            "FLIPPERS" => Some(Self::Flippers),
            _ => None,
        }
    }
}

/// Desired resting position at the end of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FinalState {
    /// No constraint.
    #[default]
    Undefined = 0,
    /// Open (eyes, mouth) or up (flippers).
    OpenUp = 1,
    /// Closed (eyes, mouth) or down (flippers).
    CloseDown = 2,
    /// Stop the motor.
    Stop = 3,
}

impl FinalState {
    /// Parse a final state token. `NDEF`/`UNDEFINED`, `OPEN`/`UP`,
    /// `CLOSE`/`DOWN` and `STOP` are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "NDEF" | "UNDEFINED" => Some(Self::Undefined),
            "OPEN" | "UP" => Some(Self::OpenUp),
            "CLOSE" | "DOWN" => Some(Self::CloseDown),
            "STOP" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Canonical token.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Undefined => "UNDEFINED",
            Self::OpenUp => "OPEN",
            Self::CloseDown => "CLOSE",
            Self::Stop => "STOP",
        }
    }
}

bitflags! {
    /// LED selection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Leds: u8 {
        /// Left LED.
        const LEFT  = 0x01;
        /// Right LED.
        const RIGHT = 0x02;
        /// Both LEDs.
        const BOTH  = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl Leds {
    /// Parse an LED selection token (`LED_NONE`, `LED_LEFT`, `LED_RIGHT`, `LED_BOTH`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LED_NONE" => Some(Self::empty()),
            "LED_LEFT" => Some(Self::LEFT),
            "LED_RIGHT" => Some(Self::RIGHT),
            "LED_BOTH" => Some(Self::BOTH),
            _ => None,
        }
    }

    /// Canonical token.
    pub fn token(self) -> &'static str {
        match (self.contains(Self::LEFT), self.contains(Self::RIGHT)) {
            (false, false) => "LED_NONE",
            (true, false) => "LED_LEFT",
            (false, true) => "LED_RIGHT",
            (true, true) => "LED_BOTH",
        }
    }
}

/// How the firmware transitions between two LED intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectType {
    /// Leave the effect parameters untouched.
    #[default]
    Unaffected,
    /// Reuse the last effect set by the driver.
    Last,
    /// No effect, on/off.
    None,
    /// Short fading effect.
    Default,
    /// Fade lasting `speed` seconds.
    FadeDuration,
    /// Fade at a rate of `speed` seconds from off to on.
    FadeRate,
    /// Gradient in `step` steps lasting `speed` seconds.
    GradientNbr,
    /// Gradient by increments of `step` lasting `speed` seconds.
    GradientDelta,
}

impl EffectType {
    /// Parse an effect type token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "UNAFFECTED" => Some(Self::Unaffected),
            "LAST" => Some(Self::Last),
            "NONE" => Some(Self::None),
            "DEFAULT" => Some(Self::Default),
            "FADE_DURATION" => Some(Self::FadeDuration),
            "FADE_RATE" => Some(Self::FadeRate),
            "GRADIENT_NBR" => Some(Self::GradientNbr),
            "GRADIENT_DELTA" => Some(Self::GradientDelta),
            _ => None,
        }
    }

    /// Canonical token.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Unaffected => "UNAFFECTED",
            Self::Last => "LAST",
            Self::None => "NONE",
            Self::Default => "DEFAULT",
            Self::FadeDuration => "FADE_DURATION",
            Self::FadeRate => "FADE_RATE",
            Self::GradientNbr => "GRADIENT_NBR",
            Self::GradientDelta => "GRADIENT_DELTA",
        }
    }
}

/// LED transition parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LedEffect {
    /// Effect kind.
    pub kind: EffectType,
    /// Duration or rate in seconds, depending on `kind`.
    pub speed: f32,
    /// Gradient step count or delta, depending on `kind`.
    pub step: u8,
}

impl LedEffect {
    /// Plain on/off transition.
    pub const NONE: LedEffect = LedEffect {
        kind: EffectType::None,
        speed: 0.0,
        step: 0,
    };
}

// ─── Per-category sub-commands ──────────────────────────────────────

/// AUDIO sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    /// Route the general channel.
    ChannelGeneral,
    /// Route the text-to-speech channel.
    ChannelTts,
    /// Mute or unmute the amplifier.
    Mute(bool),
}

/// EYES and MOUTH sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    /// Move `count` times then settle on `final_state`.
    On {
        /// Number of movements.
        count: u8,
        /// Resting position.
        final_state: FinalState,
    },
    /// Move for `duration` seconds then settle on `final_state`.
    OnDuring {
        /// Duration in seconds.
        duration: f32,
        /// Resting position.
        final_state: FinalState,
    },
    /// Single move to the open position.
    Open,
    /// Single move to the closed position.
    Close,
    /// Stop.
    Off,
}

/// FLIPPERS sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlippersCommand {
    /// Move `count` times then settle on `final_state`.
    On {
        /// Number of movements.
        count: u8,
        /// Resting position.
        final_state: FinalState,
    },
    /// Move for `duration` seconds then settle on `final_state`.
    OnDuring {
        /// Duration in seconds.
        duration: f32,
        /// Resting position.
        final_state: FinalState,
    },
    /// Single move up.
    Up,
    /// Single move down.
    Down,
    /// Stop.
    Off,
    /// Set the motor PWM.
    Speed(u8),
}

/// SPINNING sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinningCommand {
    /// Turn left by a number of quarter turns.
    LeftOn(u8),
    /// Turn right by a number of quarter turns.
    RightOn(u8),
    /// Turn left for a duration in seconds.
    LeftOnDuring(f32),
    /// Turn right for a duration in seconds.
    RightOnDuring(f32),
    /// Stop.
    Off,
    /// Set the motor PWM.
    Speed(u8),
}

/// IR sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IrCommand {
    /// Enable the receiver.
    On,
    /// Disable the receiver.
    Off,
    /// Emit an RC5 code.
    Send {
        /// RC5 address.
        address: u8,
        /// RC5 command.
        command: u8,
    },
}

/// LED sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedCommand {
    /// Switch on at an intensity in `0.0..=1.0`.
    On {
        /// Selected LEDs.
        leds: Leds,
        /// Intensity.
        intensity: f32,
    },
    /// Switch off.
    Off {
        /// Selected LEDs.
        leds: Leds,
    },
    /// Set an intensity with a transition effect.
    Set {
        /// Selected LEDs.
        leds: Leds,
        /// Intensity.
        intensity: f32,
        /// Transition.
        effect: LedEffect,
    },
    /// Pulse between two intensities.
    Pulse {
        /// Selected LEDs.
        leds: Leds,
        /// Lowest intensity.
        min_intensity: f32,
        /// Highest intensity.
        max_intensity: f32,
        /// Number of pulses.
        count: u8,
        /// Pulse period in seconds.
        period: f32,
        /// Transition.
        effect: LedEffect,
    },
    /// Blink between off and full intensity.
    Blink {
        /// Selected LEDs.
        leds: Leds,
        /// Number of pulses.
        count: u8,
        /// Pulse period in seconds.
        period: f32,
    },
}

/// SOUND_FLASH sub-commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundFlashCommand {
    /// Play a stored track.
    Play {
        /// Track number.
        track: u8,
        /// Volume in `0.0..=100.0`.
        volume: f32,
    },
}

/// A command of the `TUX_CMD` group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuxCommand {
    /// AUDIO category.
    Audio(AudioCommand),
    /// EYES category.
    Eyes(ActuatorCommand),
    /// IR category.
    Ir(IrCommand),
    /// LED category.
    Led(LedCommand),
    /// MOUTH category.
    Mouth(ActuatorCommand),
    /// SOUND_FLASH category.
    SoundFlash(SoundFlashCommand),
    /// SPINNING category.
    Spinning(SpinningCommand),
    /// FLIPPERS category.
    Flippers(FlippersCommand),
}

impl TuxCommand {
    /// Category of this command.
    pub const fn category(&self) -> CommandCategory {
        match self {
            Self::Audio(_) => CommandCategory::Audio,
            Self::Eyes(_) => CommandCategory::Eyes,
            Self::Ir(_) => CommandCategory::Ir,
            Self::Led(_) => CommandCategory::Led,
            Self::Mouth(_) => CommandCategory::Mouth,
            Self::SoundFlash(_) => CommandCategory::SoundFlash,
            Self::Spinning(_) => CommandCategory::Spinning,
            Self::Flippers(_) => CommandCategory::Flippers,
        }
    }
}

/// A parsed command, ready to execute or to schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// High-level robot command (`TUX_CMD`).
    Tux(TuxCommand),
    /// Raw 5-byte report (`RAW_CMD`).
    Raw([u8; 5]),
}

impl Command {
    /// Category of a `TUX_CMD` command, `None` for raw reports.
    pub const fn category(&self) -> Option<CommandCategory> {
        match self {
            Self::Tux(cmd) => Some(cmd.category()),
            Self::Raw(_) => None,
        }
    }
}

fn bool_token(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tux = match self {
            Self::Raw(raw) => {
                write!(f, "RAW_CMD")?;
                for byte in raw {
                    write!(f, ":0x{byte:02X}")?;
                }
                return Ok(());
            }
            Self::Tux(tux) => tux,
        };
        write!(f, "TUX_CMD:{}:", tux.category().token())?;
        match tux {
            TuxCommand::Audio(cmd) => match cmd {
                AudioCommand::ChannelGeneral => write!(f, "CHANNEL_GENERAL"),
                AudioCommand::ChannelTts => write!(f, "CHANNEL_TTS"),
                AudioCommand::Mute(flag) => write!(f, "MUTE:{}", bool_token(*flag)),
            },
            TuxCommand::Eyes(cmd) | TuxCommand::Mouth(cmd) => match cmd {
                ActuatorCommand::On { count, final_state } => {
                    write!(f, "ON:{count},{}", final_state.token())
                }
                ActuatorCommand::OnDuring {
                    duration,
                    final_state,
                } => write!(f, "ON_DURING:{duration},{}", final_state.token()),
                ActuatorCommand::Open => write!(f, "OPEN"),
                ActuatorCommand::Close => write!(f, "CLOSE"),
                ActuatorCommand::Off => write!(f, "OFF"),
            },
            TuxCommand::Flippers(cmd) => match cmd {
                FlippersCommand::On { count, final_state } => {
                    write!(f, "ON:{count},{}", final_state.token())
                }
                FlippersCommand::OnDuring {
                    duration,
                    final_state,
                } => write!(f, "ON_DURING:{duration},{}", final_state.token()),
                FlippersCommand::Up => write!(f, "UP"),
                FlippersCommand::Down => write!(f, "DOWN"),
                FlippersCommand::Off => write!(f, "OFF"),
                FlippersCommand::Speed(speed) => write!(f, "SPEED:{speed}"),
            },
            TuxCommand::Spinning(cmd) => match cmd {
                SpinningCommand::LeftOn(n) => write!(f, "LEFT_ON:{n}"),
                SpinningCommand::RightOn(n) => write!(f, "RIGHT_ON:{n}"),
                SpinningCommand::LeftOnDuring(d) => write!(f, "LEFT_ON_DURING:{d}"),
                SpinningCommand::RightOnDuring(d) => write!(f, "RIGHT_ON_DURING:{d}"),
                SpinningCommand::Off => write!(f, "OFF"),
                SpinningCommand::Speed(speed) => write!(f, "SPEED:{speed}"),
            },
            TuxCommand::Ir(cmd) => match cmd {
                IrCommand::On => write!(f, "ON"),
                IrCommand::Off => write!(f, "OFF"),
                IrCommand::Send { address, command } => write!(f, "SEND:{address},{command}"),
            },
            TuxCommand::Led(cmd) => match cmd {
                LedCommand::On { leds, intensity } => {
                    write!(f, "ON:{},{intensity}", leds.token())
                }
                LedCommand::Off { leds } => write!(f, "OFF:{}", leds.token()),
                LedCommand::Set {
                    leds,
                    intensity,
                    effect,
                } => write!(
                    f,
                    "SET:{},{intensity},{},{},{}",
                    leds.token(),
                    effect.kind.token(),
                    effect.speed,
                    effect.step
                ),
                LedCommand::Pulse {
                    leds,
                    min_intensity,
                    max_intensity,
                    count,
                    period,
                    effect,
                } => write!(
                    f,
                    "PULSE:{},{min_intensity},{max_intensity},{count},{period},{},{},{}",
                    leds.token(),
                    effect.kind.token(),
                    effect.speed,
                    effect.step
                ),
                LedCommand::Blink {
                    leds,
                    count,
                    period,
                } => write!(f, "BLINK:{},{count},{period}", leds.token()),
            },
            TuxCommand::SoundFlash(SoundFlashCommand::Play { track, volume }) => {
                write!(f, "PLAY:{track},{volume}")
            }
        }
    }
}
