//! Registry of dongle transports.
//!
//! Maps a transport name from the configuration (`usb.transport`) to the
//! factory building it. The registry is constructed at startup and passed
//! by value; there is no global state.

use std::collections::HashMap;
use tux_common::transport::{Transport, TransportError, TransportFactory};

/// Registry of available transports.
pub struct TransportRegistry {
    factories: HashMap<&'static str, TransportFactory>,
}

impl TransportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in transport.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::transports::register_all_transports(&mut registry);
        registry
    }

    /// Register a transport factory.
    ///
    /// # Panics
    /// Panics if a transport with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: TransportFactory) {
        if self.factories.contains_key(name) {
            panic!("Transport '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a transport factory by name.
    pub fn get_factory(&self, name: &str) -> Option<TransportFactory> {
        self.factories.get(name).copied()
    }

    /// Create a transport instance by name.
    ///
    /// # Errors
    /// Returns `TransportError::TransportNotFound` if no transport with the
    /// given name is registered.
    pub fn create_transport(&self, name: &str) -> Result<Box<dyn Transport>, TransportError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| TransportError::TransportNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered transport names.
    pub fn list_transports(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tux_common::transport::{ReceiveReport, SendReport};

    struct NullTransport;

    impl Transport for NullTransport {
        fn name(&self) -> &'static str {
            "null"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn open(&mut self, _vendor_id: u16, _product_id: u16) -> Result<(), TransportError> {
            Ok(())
        }

        fn write(&mut self, _report: &SendReport) -> Result<(), TransportError> {
            Ok(())
        }

        fn read(&mut self, _report: &mut ReceiveReport) -> Result<usize, TransportError> {
            Ok(0)
        }

        fn close(&mut self) {}

        fn is_open(&self) -> bool {
            true
        }
    }

    fn create_null() -> Box<dyn Transport> {
        Box::new(NullTransport)
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = TransportRegistry::new();
        reg.register("null", create_null);

        let transport = reg.create_transport("null").expect("should create");
        assert_eq!(transport.name(), "null");
    }

    #[test]
    fn registry_transport_not_found() {
        let reg = TransportRegistry::new();
        let result = reg.create_transport("nonexistent");
        assert!(matches!(result, Err(TransportError::TransportNotFound(_))));
    }

    #[test]
    fn builtin_transports() {
        let mut names = TransportRegistry::with_builtin().list_transports();
        names.sort();
        assert_eq!(names, vec!["hidraw", "simulation"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = TransportRegistry::new();
        reg.register("dup", create_null);
        reg.register("dup", create_null);
    }
}
