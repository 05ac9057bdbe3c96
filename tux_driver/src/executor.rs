//! Command execution: immediate dispatch, delayed insertion and macros.

use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{debug, warn};
use tux_common::error::{TuxError, TuxResult};
use tux_common::protocol::command::{Command, TuxCommand};

use crate::context::DriverContext;
use crate::parser::{parse_command, parse_macro_line};

/// Commands restoring the rest position, with their delays.
const RESET_POSITIONS: [(f32, &str); 5] = [
    (0.0, "TUX_CMD:EYES:OPEN"),
    (0.3, "TUX_CMD:MOUTH:CLOSE"),
    (0.0, "TUX_CMD:FLIPPERS:DOWN"),
    (0.0, "TUX_CMD:SPINNING:OFF"),
    (0.0, "TUX_CMD:LED:ON:LED_BOTH,1.0"),
];

impl DriverContext {
    /// Execute a parsed command now. Returns whether every frame was written.
    pub fn execute(&self, command: &Command) -> bool {
        match command {
            Command::Raw(report) => self.send_raw(report),
            Command::Tux(tux) => match tux {
                TuxCommand::Audio(cmd) => self.execute_audio(cmd),
                TuxCommand::Eyes(cmd) => self.execute_eyes(cmd),
                TuxCommand::Mouth(cmd) => self.execute_mouth(cmd),
                TuxCommand::Flippers(cmd) => self.execute_flippers(cmd),
                TuxCommand::Spinning(cmd) => self.execute_spinning(cmd),
                TuxCommand::Led(cmd) => self.execute_led(cmd),
                TuxCommand::Ir(cmd) => self.execute_ir(cmd),
                TuxCommand::SoundFlash(cmd) => self.execute_sound_flash(cmd),
            },
        }
    }

    /// Whether text commands are accepted.
    pub fn parser_enabled(&self) -> bool {
        self.parser_enabled.load(Ordering::SeqCst)
    }

    /// Parse `text` and schedule it `delay` seconds from now on the user
    /// stack.
    ///
    /// # Errors
    /// - [`TuxError::ParserDisabled`] during a reflash.
    /// - [`TuxError::InvalidCommand`] when `text` does not parse.
    /// - [`TuxError::StackOverflow`] when the user stack is full.
    pub fn insert_user(&self, delay: f32, text: &str) -> TuxResult<()> {
        if !self.parser_enabled() {
            return Err(TuxError::ParserDisabled);
        }
        let command = parse_command(text)?;
        let now = self.now();
        self.stacks
            .lock()
            .user
            .insert(command, f64::from(delay), now)?;
        Ok(())
    }

    /// Execute `text` now, or schedule it when `delay` is not zero.
    ///
    /// # Errors
    /// As [`insert_user`](Self::insert_user).
    pub fn perform_command(&self, delay: f32, text: &str) -> TuxResult<()> {
        if !self.parser_enabled() {
            return Err(TuxError::ParserDisabled);
        }
        if delay == 0.0 {
            let command = parse_command(text)?;
            debug!("Perform an instant command : [{}]", text);
            self.execute(&command);
            Ok(())
        } else {
            self.insert_user(delay, text)
        }
    }

    /// Run a macro: one `<delay>:<command>` per line.
    ///
    /// Lines that do not match the format and commands that do not parse are
    /// skipped. Returns the result of the last scheduled line.
    ///
    /// # Errors
    /// [`TuxError::ParserDisabled`] during a reflash, or the error of the
    /// last line.
    pub fn run_macro(&self, text: &str) -> TuxResult<()> {
        if !self.parser_enabled() {
            return Err(TuxError::ParserDisabled);
        }
        let mut result = Ok(());
        for line in text.lines() {
            let Some((delay, command)) = parse_macro_line(line) else {
                continue;
            };
            result = self.perform_command(delay, command);
            match result {
                Err(TuxError::InvalidCommand) => {
                    warn!("Macro line skipped : [{}]", line);
                }
                Err(e) => return Err(e),
                Ok(()) => {}
            }
        }
        result
    }

    /// Run a macro file.
    ///
    /// # Errors
    /// [`TuxError::FileError`] when the file cannot be read, otherwise as
    /// [`run_macro`](Self::run_macro).
    pub fn run_macro_file(&self, path: &Path) -> TuxResult<()> {
        let text = fs::read_to_string(path).map_err(|e| {
            warn!("Cannot read macro file {}: {}", path.display(), e);
            TuxError::FileError
        })?;
        self.run_macro(&text)
    }

    /// Bring the body back to its rest position.
    pub fn reset_positions(&self) {
        for (delay, text) in RESET_POSITIONS {
            if let Err(e) = self.perform_command(delay, text) {
                warn!("Reset position [{}] failed: {}", text, e);
            }
        }
    }
}
