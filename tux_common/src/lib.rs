//! Tux Common Library
//!
//! This crate provides the definitions shared by the Tux Droid driver and
//! its transports: wire protocol, error codes, status catalogue,
//! configuration loading and the transport and clock abstractions.
//!
//! # Module Structure
//!
//! - [`consts`] - System-wide numeric limits and wire sizes
//! - [`error`] - Caller-visible error codes
//! - [`config`] - Configuration loading traits and types
//! - [`protocol`] - Frame headers, opcodes, register decoders, typed commands
//! - [`status`] - Status catalogue and values
//! - [`descriptor`] - Firmware, sound flash and id descriptors
//! - [`transport`] - Transport trait and errors
//! - [`clock`] - Time source abstraction
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use tux_common::prelude::*;
//!
//! let header = FrameHeader::from_u8(0xC7);
//! assert_eq!(header, Some(FrameHeader::Battery));
//! ```

#![deny(missing_docs)]

pub mod clock;
pub mod config;
pub mod consts;
pub mod descriptor;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod status;
pub mod transport;
