//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use tux_common::prelude::*;` and get
//! the most important types without listing individual paths.

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, DriverConfig, SharedConfig};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{TuxError, TuxResult, strerror};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::command::{
    ActuatorCommand, AudioCommand, Command, CommandCategory, EffectType, FinalState,
    FlippersCommand, IrCommand, LedCommand, LedEffect, Leds, SoundFlashCommand, SpinningCommand,
    TuxCommand,
};
pub use crate::protocol::frame::{Frame, FrameHeader};
pub use crate::protocol::opcodes::Route;

// ─── Status ─────────────────────────────────────────────────────────
pub use crate::status::{StatusId, StatusKind, StatusValue};

// ─── Transport & time ───────────────────────────────────────────────
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::transport::{Transport, TransportError, TransportFactory};

/// Default polling period as Duration.
pub const DEFAULT_READ_INTERVAL: Duration =
    Duration::from_millis(crate::consts::READ_INTERVAL_MS);
