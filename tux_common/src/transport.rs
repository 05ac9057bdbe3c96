//! Transport trait and error types.
//!
//! This module defines:
//! - `Transport` trait - Interface for pluggable dongle transports
//! - `TransportError` enum - Error types for transport operations
//! - `TransportFactory` type alias - Factory function type

use crate::consts::{RECEIVE_LEN, SEND_LEN};
use thiserror::Error;

/// Outbound report: routing byte followed by a 4-byte frame.
pub type SendReport = [u8; SEND_LEN];

/// Inbound polling report.
pub type ReceiveReport = [u8; RECEIVE_LEN];

/// Error types for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Operation attempted before `open()` succeeded.
    #[error("Transport not connected")]
    NotConnected,

    /// No device matches the vendor/product identifiers.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The device went away.
    #[error("Device disconnected")]
    Disconnected,

    /// `open()` called twice.
    #[error("Transport already started")]
    AlreadyStarted,

    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Transport name not registered.
    #[error("Transport not found: {0}")]
    TransportNotFound(String),
}

/// Factory function type for creating transport instances.
pub type TransportFactory = fn() -> Box<dyn Transport>;

/// Trait defining the interface for dongle transports.
///
/// The driver owns one transport and talks to the dongle exclusively through
/// fixed-size reports. Implementations include the USB HID device and a
/// simulated dongle.
///
/// # Lifecycle
///
/// 1. `open()` - Called by the core loop on every acquisition attempt
/// 2. `write()` / `read()` - Called from the polling loop and from command callers
/// 3. `close()` - Called on disconnect or shutdown
///
/// # Timing
///
/// | Operation | Expected duration |
/// |-----------|-------------------|
/// | `open()` | < 1 second |
/// | `write()` | a few milliseconds |
/// | `read()` | < polling interval |
pub trait Transport: Send + Sync {
    /// Returns the transport's unique identifier (e.g., "simulation", "hid").
    fn name(&self) -> &'static str;

    /// Returns the transport's semantic version.
    fn version(&self) -> &'static str;

    /// Open the device matching the identifiers.
    ///
    /// # Errors
    /// `TransportError::DeviceNotFound` when no device is present.
    fn open(&mut self, vendor_id: u16, product_id: u16) -> Result<(), TransportError>;

    /// Write one outbound report.
    fn write(&mut self, report: &SendReport) -> Result<(), TransportError>;

    /// Read one inbound polling report. Returns the number of bytes read.
    fn read(&mut self, report: &mut ReceiveReport) -> Result<usize, TransportError>;

    /// Release the device. Must be idempotent.
    fn close(&mut self);

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoopbackTransport {
        open: bool,
        last: Option<SendReport>,
    }

    impl Transport for LoopbackTransport {
        fn name(&self) -> &'static str {
            "loopback"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn open(&mut self, _vendor_id: u16, _product_id: u16) -> Result<(), TransportError> {
            if self.open {
                return Err(TransportError::AlreadyStarted);
            }
            self.open = true;
            Ok(())
        }

        fn write(&mut self, report: &SendReport) -> Result<(), TransportError> {
            if !self.open {
                return Err(TransportError::NotConnected);
            }
            self.last = Some(*report);
            Ok(())
        }

        fn read(&mut self, report: &mut ReceiveReport) -> Result<usize, TransportError> {
            let last = self.last.ok_or(TransportError::Disconnected)?;
            report[..SEND_LEN].copy_from_slice(&last);
            Ok(RECEIVE_LEN)
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Io("pipe broken".to_string());
        assert!(err.to_string().contains("pipe broken"));

        let err = TransportError::TransportNotFound("hid".to_string());
        assert!(err.to_string().contains("hid"));
    }

    #[test]
    fn trait_object_lifecycle() {
        let mut t: Box<dyn Transport> = Box::new(LoopbackTransport {
            open: false,
            last: None,
        });
        assert_eq!(t.write(&[0; SEND_LEN]), Err(TransportError::NotConnected));
        t.open(0x03EB, 0xFF07).unwrap();
        assert_eq!(t.open(0x03EB, 0xFF07), Err(TransportError::AlreadyStarted));
        t.write(&[1, 2, 3, 4, 5]).unwrap();
        let mut buf = [0u8; RECEIVE_LEN];
        assert_eq!(t.read(&mut buf).unwrap(), RECEIVE_LEN);
        assert_eq!(&buf[..5], &[1, 2, 3, 4, 5]);
        t.close();
        assert!(!t.is_open());
    }
}
