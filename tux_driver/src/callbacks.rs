//! Host callbacks.
//!
//! Callbacks are stored as `Arc`s so that they can be cloned out of the
//! lock and invoked without holding it.

use std::sync::Arc;

/// Status event callback, receives a `name:type:value:age` line.
pub type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Parameterless callback.
pub type SimpleCallback = Arc<dyn Fn() + Send + Sync>;

/// Registered host callbacks.
#[derive(Default, Clone)]
pub struct Callbacks {
    /// Status event.
    pub status: Option<StatusCallback>,
    /// End of a polling cycle.
    pub end_cycle: Option<SimpleCallback>,
    /// Dongle captured.
    pub connected: Option<SimpleCallback>,
    /// Dongle lost.
    pub disconnected: Option<SimpleCallback>,
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("status", &self.status.is_some())
            .field("end_cycle", &self.end_cycle.is_some())
            .field("connected", &self.connected.is_some())
            .field("disconnected", &self.disconnected.is_some())
            .finish()
    }
}
