//! Command text parser.
//!
//! Command lines look like `GROUP:CATEGORY[:SUBCOMMAND[:param,param,...]]`.
//! Colons and commas are equivalent delimiters, so every category reads its
//! parameters at fixed token positions. A missing token reads as the empty
//! string and fails whatever conversion it is given.
//!
//! Parameter conversions accept the same inputs as C `sscanf`: integers and
//! floats may be followed by garbage, booleans are the exact literals
//! `True` and `False`, raw bytes are `0xNN`.

use heapless::Vec as HVec;
use tracing::debug;
use tux_common::consts::{MAX_TOKEN_LEN, MAX_TOKENS};
use tux_common::error::{TuxError, TuxResult};
use tux_common::protocol::command::{
    ActuatorCommand, AudioCommand, Command, EffectType, FinalState, FlippersCommand, IrCommand,
    LedCommand, LedEffect, Leds, SoundFlashCommand, SpinningCommand, TuxCommand,
};

/// Tokens of one command line.
pub type Tokens<'a> = HVec<&'a str, MAX_TOKENS>;

const DELIMITERS: [char; 2] = [':', ','];

/// Split `text` on `:` and `,`.
///
/// Empty tokens are kept. Splitting stops after [`MAX_TOKENS`] tokens; the
/// remainder of the text is dropped.
pub fn tokenize(text: &str) -> Tokens<'_> {
    let mut tokens = Tokens::new();
    let mut rest = text;
    loop {
        match rest.find(DELIMITERS) {
            Some(pos) => {
                if tokens.push(&rest[..pos]).is_err() || tokens.is_full() {
                    break;
                }
                rest = &rest[pos + 1..];
            }
            None => {
                let _ = tokens.push(rest);
                break;
            }
        }
    }
    tokens
}

// ─── Scalar conversions ─────────────────────────────────────────────

fn digits_end(s: &str, start: usize, radix: u32) -> usize {
    s[start..]
        .find(|c: char| !c.is_digit(radix))
        .map_or(s.len(), |p| start + p)
}

/// Leading decimal integer, `%d` style.
fn scan_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let end = digits_end(s, sign_len, 10);
    if end == sign_len {
        return None;
    }
    s[..end].parse().ok()
}

/// Leading floating point number, `%f` style.
fn scan_float(text: &str) -> Option<f32> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(s.starts_with(['+', '-']));
    let int_end = digits_end(s, end, 10);
    let mut mantissa_digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_end(s, end + 1, 10);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_end(s, exp, 10);
        if exp_end > exp {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}

fn to_u8(token: &str) -> Option<u8> {
    scan_int(token).and_then(|v| u8::try_from(v).ok())
}

fn to_f32(token: &str) -> Option<f32> {
    scan_float(token)
}

fn to_bool(token: &str) -> Option<bool> {
    match token {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

/// `0x` followed by one or two hex digits.
fn hex_to_u8(token: &str) -> Option<u8> {
    let digits = token.strip_prefix("0x")?.trim_start();
    let end = digits_end(digits, 0, 16).min(2);
    if end == 0 {
        return None;
    }
    u8::from_str_radix(&digits[..end], 16).ok()
}

// ─── Category parsers ───────────────────────────────────────────────

struct Args<'t, 'a> {
    tokens: &'t Tokens<'a>,
}

impl Args<'_, '_> {
    fn at(&self, index: usize) -> &str {
        self.tokens.get(index).copied().unwrap_or("")
    }

    fn u8(&self, index: usize) -> Option<u8> {
        to_u8(self.at(index))
    }

    fn f32(&self, index: usize) -> Option<f32> {
        to_f32(self.at(index))
    }

    fn final_state(&self, index: usize) -> Option<FinalState> {
        FinalState::from_token(self.at(index))
    }

    fn leds(&self, index: usize) -> Option<Leds> {
        Leds::from_token(self.at(index))
    }

    fn effect(&self, index: usize) -> Option<LedEffect> {
        Some(LedEffect {
            kind: EffectType::from_token(self.at(index))?,
            speed: self.f32(index + 1)?,
            step: self.u8(index + 2)?,
        })
    }
}

fn parse_audio(args: &Args) -> Option<AudioCommand> {
    match args.at(2) {
        "CHANNEL_GENERAL" => Some(AudioCommand::ChannelGeneral),
        "CHANNEL_TTS" => Some(AudioCommand::ChannelTts),
        "MUTE" => to_bool(args.at(3)).map(AudioCommand::Mute),
        _ => None,
    }
}

fn parse_actuator(args: &Args) -> Option<ActuatorCommand> {
    match args.at(2) {
        "ON" => Some(ActuatorCommand::On {
            count: args.u8(3)?,
            final_state: args.final_state(4)?,
        }),
        "ON_DURING" => Some(ActuatorCommand::OnDuring {
            duration: args.f32(3)?,
            final_state: args.final_state(4)?,
        }),
        "OPEN" => Some(ActuatorCommand::Open),
        "CLOSE" => Some(ActuatorCommand::Close),
        "OFF" => Some(ActuatorCommand::Off),
        _ => None,
    }
}

fn parse_flippers(args: &Args) -> Option<FlippersCommand> {
    match args.at(2) {
        "ON" => Some(FlippersCommand::On {
            count: args.u8(3)?,
            final_state: args.final_state(4)?,
        }),
        "ON_DURING" => Some(FlippersCommand::OnDuring {
            duration: args.f32(3)?,
            final_state: args.final_state(4)?,
        }),
        "UP" => Some(FlippersCommand::Up),
        "DOWN" => Some(FlippersCommand::Down),
        "OFF" => Some(FlippersCommand::Off),
        "SPEED" => args.u8(3).map(FlippersCommand::Speed),
        _ => None,
    }
}

fn parse_spinning(args: &Args) -> Option<SpinningCommand> {
    match args.at(2) {
        "LEFT_ON" => args.u8(3).map(SpinningCommand::LeftOn),
        "RIGHT_ON" => args.u8(3).map(SpinningCommand::RightOn),
        "LEFT_ON_DURING" => args.f32(3).map(SpinningCommand::LeftOnDuring),
        "RIGHT_ON_DURING" => args.f32(3).map(SpinningCommand::RightOnDuring),
        "OFF" => Some(SpinningCommand::Off),
        "SPEED" => args.u8(3).map(SpinningCommand::Speed),
        _ => None,
    }
}

fn parse_ir(args: &Args) -> Option<IrCommand> {
    match args.at(2) {
        "ON" => Some(IrCommand::On),
        "OFF" => Some(IrCommand::Off),
        "SEND" => Some(IrCommand::Send {
            address: args.u8(3)?,
            command: args.u8(4)?,
        }),
        _ => None,
    }
}

fn parse_led(args: &Args) -> Option<LedCommand> {
    match args.at(2) {
        "ON" => Some(LedCommand::On {
            leds: args.leds(3)?,
            intensity: args.f32(4)?,
        }),
        "OFF" => Some(LedCommand::Off {
            leds: args.leds(3)?,
        }),
        "SET" => Some(LedCommand::Set {
            leds: args.leds(3)?,
            intensity: args.f32(4)?,
            effect: args.effect(5)?,
        }),
        "PULSE" => Some(LedCommand::Pulse {
            leds: args.leds(3)?,
            min_intensity: args.f32(4)?,
            max_intensity: args.f32(5)?,
            count: args.u8(6)?,
            period: args.f32(7)?,
            effect: args.effect(8)?,
        }),
        "BLINK" => Some(LedCommand::Blink {
            leds: args.leds(3)?,
            count: args.u8(4)?,
            period: args.f32(5)?,
        }),
        _ => None,
    }
}

fn parse_sound_flash(args: &Args) -> Option<SoundFlashCommand> {
    match args.at(2) {
        "PLAY" => Some(SoundFlashCommand::Play {
            track: args.u8(3)?,
            volume: args.f32(4)?,
        }),
        _ => None,
    }
}

fn parse_tux(args: &Args) -> Option<TuxCommand> {
    match args.at(1) {
        "AUDIO" => parse_audio(args).map(TuxCommand::Audio),
        "EYES" => parse_actuator(args).map(TuxCommand::Eyes),
        "IR" => parse_ir(args).map(TuxCommand::Ir),
        "LED" => parse_led(args).map(TuxCommand::Led),
        "MOUTH" => parse_actuator(args).map(TuxCommand::Mouth),
        "SOUND_FLASH" => parse_sound_flash(args).map(TuxCommand::SoundFlash),
        "SPINNING" => parse_spinning(args).map(TuxCommand::Spinning),
        "FLIPPERS" => parse_flippers(args).map(TuxCommand::Flippers),
        _ => None,
    }
}

fn parse_raw(args: &Args) -> Option<[u8; 5]> {
    let mut raw = [0u8; 5];
    for (i, byte) in raw.iter_mut().enumerate() {
        *byte = hex_to_u8(args.at(i + 1))?;
    }
    Some(raw)
}

/// Parse one command line.
///
/// # Errors
/// [`TuxError::InvalidCommand`] for an unknown group, category or
/// sub-command, and for any parameter that fails its conversion.
pub fn parse_command(text: &str) -> TuxResult<Command> {
    debug!("parse_command : [{}]", text);
    let tokens = tokenize(text);
    if tokens.iter().any(|token| token.len() >= MAX_TOKEN_LEN) {
        return Err(TuxError::InvalidCommand);
    }
    let args = Args { tokens: &tokens };
    let command = match args.at(0) {
        "TUX_CMD" => parse_tux(&args).map(Command::Tux),
        "RAW_CMD" => parse_raw(&args).map(Command::Raw),
        _ => None,
    };
    command.ok_or(TuxError::InvalidCommand)
}

/// Split a macro line `<delay>:<command>`.
///
/// Returns `None` for lines that do not match, which macros skip.
pub fn parse_macro_line(line: &str) -> Option<(f32, &str)> {
    let s = line.trim_start();
    let colon = s.find(':')?;
    // the float must reach the colon
    let delay: f32 = s[..colon].parse().ok()?;
    let command = s[colon + 1..].split('\n').next().unwrap_or("");
    if command.is_empty() {
        return None;
    }
    Some((delay, command))
}
