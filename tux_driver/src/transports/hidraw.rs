//! Linux `hidraw` transport.
//!
//! The dongle is found by scanning `/sys/class/hidraw/*/device/uevent` for
//! a `HID_ID` line carrying the vendor and product identifiers, then the
//! matching `/dev/hidrawN` node is opened read/write. The dongle uses
//! unnumbered reports, so every write is prefixed with report number 0.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tux_common::consts::SEND_LEN;
use tux_common::transport::{ReceiveReport, SendReport, Transport, TransportError};

const SYSFS_HIDRAW: &str = "/sys/class/hidraw";

/// Transport over a `hidraw` device node.
pub struct HidrawTransport {
    device: Option<File>,
    path: Option<PathBuf>,
}

impl HidrawTransport {
    /// Closed transport.
    pub fn new() -> Self {
        Self {
            device: None,
            path: None,
        }
    }

    /// Device node in use, if open.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Default for HidrawTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a `uevent` file describes the device.
fn uevent_matches(uevent: &str, vendor_id: u16, product_id: u16) -> bool {
    let wanted = format!("{vendor_id:08X}:{product_id:08X}");
    uevent
        .lines()
        .filter_map(|line| line.strip_prefix("HID_ID="))
        .any(|id| id.to_ascii_uppercase().ends_with(&wanted))
}

fn find_device(vendor_id: u16, product_id: u16) -> Option<PathBuf> {
    let entries = fs::read_dir(SYSFS_HIDRAW).ok()?;
    for entry in entries.flatten() {
        let uevent = entry.path().join("device").join("uevent");
        let Ok(content) = fs::read_to_string(&uevent) else {
            continue;
        };
        if uevent_matches(&content, vendor_id, product_id) {
            return Some(Path::new("/dev").join(entry.file_name()));
        }
    }
    None
}

fn io_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::NotFound | ErrorKind::BrokenPipe => TransportError::Disconnected,
        _ => TransportError::Io(e.to_string()),
    }
}

impl Transport for HidrawTransport {
    fn name(&self) -> &'static str {
        "hidraw"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn open(&mut self, vendor_id: u16, product_id: u16) -> Result<(), TransportError> {
        if self.device.is_some() {
            return Err(TransportError::AlreadyStarted);
        }
        let path = find_device(vendor_id, product_id).ok_or_else(|| {
            TransportError::DeviceNotFound(format!("{vendor_id:04x}:{product_id:04x}"))
        })?;
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(io_error)?;
        info!("Opened dongle at {}", path.display());
        self.device = Some(device);
        self.path = Some(path);
        Ok(())
    }

    fn write(&mut self, report: &SendReport) -> Result<(), TransportError> {
        let device = self.device.as_mut().ok_or(TransportError::NotConnected)?;
        let mut buffer = [0u8; SEND_LEN + 1];
        buffer[1..].copy_from_slice(report);
        device.write_all(&buffer).map_err(io_error)
    }

    fn read(&mut self, report: &mut ReceiveReport) -> Result<usize, TransportError> {
        let device = self.device.as_mut().ok_or(TransportError::NotConnected)?;
        device.read(report).map_err(io_error)
    }

    fn close(&mut self) {
        if let Some(path) = self.path.take() {
            debug!("Closing {}", path.display());
        }
        self.device = None;
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

/// Factory function to create a hidraw transport instance.
pub fn create_transport() -> Box<dyn Transport> {
    Box::new(HidrawTransport::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uevent_hid_id_matching() {
        let uevent = "DRIVER=hid-generic\nHID_ID=0003:000003EB:0000FF07\nHID_NAME=TUX RF DONGLE\n";
        assert!(uevent_matches(uevent, 0x03EB, 0xFF07));
        assert!(!uevent_matches(uevent, 0x03EB, 0xFF08));
        assert!(uevent_matches(
            "HID_ID=0003:000003eb:0000ff07",
            0x03EB,
            0xFF07
        ));
        assert!(!uevent_matches("HID_NAME=x", 0x03EB, 0xFF07));
    }

    #[test]
    fn closed_transport_refuses_io() {
        let mut transport = HidrawTransport::new();
        assert!(!transport.is_open());
        assert_eq!(
            transport.write(&[0; SEND_LEN]),
            Err(TransportError::NotConnected)
        );
        let mut report = [0u8; tux_common::consts::RECEIVE_LEN];
        assert_eq!(transport.read(&mut report), Err(TransportError::NotConnected));
        transport.close();
        assert!(transport.path().is_none());
    }
}
