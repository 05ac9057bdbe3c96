//! # Tux Droid Driver Library
//!
//! Host-side driver for the Tux Droid robot behind its USB radio dongle.
//!
//! The driver polls the dongle for status frames, keeps a typed status table
//! up to date, raises events on meaningful changes and turns text commands
//! into hardware frames. Transports implement the `Transport` trait defined
//! in `tux_common::transport`.
//!
//! # Module Structure
//!
//! - [`api`] - `TuxDriver` handle used by host applications
//! - [`core`] - `TuxCore` struct, read loop management
//! - [`context`] - Shared driver state and frame dispatch
//! - [`link`] - Dongle link and polling
//! - [`logging`] - Log subscriber, runtime level and target
//! - [`hw_status`] - Raw hardware register snapshot
//! - [`status_table`] - High-level statuses and their events
//! - [`parser`] - Text command tokenizer and parser
//! - [`executor`] - Command execution and macros
//! - [`scheduler`] - Delayed command stacks
//! - [`movements`] - Movement frame planning
//! - [`subsystems`] - Per-subsystem updaters and commands
//! - [`firmware`] - Firmware versioning sequence
//! - [`reflash`] - Sound flash reprogramming
//! - [`callbacks`] - Host callbacks
//! - [`transport_registry`] - Transport factory registration
//! - [`transports`] - Transport implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      tux_driver (single crate)                   │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │  TuxDriver  │◄──►│   TuxCore    │◄──►│ Transport Registry  │  │
//! │  │   (api)     │    │ (read loop)  │    │                     │  │
//! │  └──────┬──────┘    └──────┬───────┘    └─────────────────────┘  │
//! │         │                  │                                     │
//! │         ▼                  ▼                                     │
//! │  ┌────────────────────────────────┐    ┌─────────────────────┐   │
//! │  │         DriverContext          │◄──►│  Transport          │   │
//! │  │ status · stacks · subsystems   │    │  trait (hidraw/sim) │   │
//! │  └────────────────────────────────┘    └─────────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod api;
pub mod callbacks;
pub mod context;
pub mod core;
pub mod executor;
pub mod firmware;
pub mod hw_status;
pub mod link;
pub mod logging;
pub mod movements;
pub mod parser;
pub mod reflash;
pub mod scheduler;
pub mod status_table;
pub mod subsystems;
pub mod transport_registry;
pub mod transports;

// Re-export key types for convenience
pub use crate::api::{DriverError, NULL_VALUE, TuxDriver};
pub use crate::context::DriverContext;
pub use crate::core::{LoopStats, StepOutcome, TuxCore};
pub use crate::logging::{LogFormat, LogTarget, LoggingError};
pub use crate::reflash::{AplayPlayer, AudioPlayer};
pub use crate::status_table::status_doc;
pub use crate::transport_registry::TransportRegistry;
