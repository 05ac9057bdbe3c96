//! Simulation transport module.
//!
//! This module provides a simulated dongle and robot for development and
//! testing without physical hardware.

mod robot;
mod transport;

pub use robot::{Actuator, SimulatedRobot, Spinner};
pub use transport::SimulationTransport;

use tux_common::transport::Transport;

/// Factory function to create a simulation transport instance.
pub fn create_transport() -> Box<dyn Transport> {
    Box::new(SimulationTransport::new())
}
