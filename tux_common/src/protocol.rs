//! Wire protocol of the Tux Droid dongle.
//!
//! This module contains the frame headers, opcodes, hardware register
//! decoders and the typed command model shared by the driver and the
//! transports.

pub mod command;
pub mod frame;
pub mod opcodes;
pub mod registers;
