//! Dongle transport implementations.
//!
//! - [`hidraw`] - Linux `hidraw` character device
//! - [`simulation`] - Simulated dongle and robot for development and testing
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `transports/`
//! 2. Implement the `Transport` trait from `tux_common::transport`
//! 3. Register the transport in [`register_all_transports`]

pub mod hidraw;
pub mod simulation;

use crate::transport_registry::TransportRegistry;

/// Register every built-in transport.
pub fn register_all_transports(registry: &mut TransportRegistry) {
    registry.register("hidraw", hidraw::create_transport);
    registry.register("simulation", simulation::create_transport);
}
