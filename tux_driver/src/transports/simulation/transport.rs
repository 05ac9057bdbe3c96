//! Simulation transport implementation.
//!
//! The `SimulationTransport` implements the `Transport` trait on top of a
//! [`SimulatedRobot`]. Status requests are answered on the next read with a
//! report built from one robot tick; every other report is routed to the
//! robot or to the dongle model.

use super::robot::SimulatedRobot;
use tracing::{debug, info};
use tux_common::consts::{FRAME_LEN, REPORT_HEADER_LEN, TUX_PID, TUX_VID};
use tux_common::protocol::frame::Frame;
use tux_common::protocol::opcodes::{
    RESET_DONGLE_REPORT, RESET_RF_REPORT, Route, STATUS_REQUEST_REPORT,
};
use tux_common::transport::{ReceiveReport, SendReport, Transport, TransportError};

/// Simulated dongle transport.
pub struct SimulationTransport {
    /// Transport name
    name: &'static str,
    /// Transport version
    version: &'static str,
    /// Device opened
    open: bool,
    /// Simulated robot and dongle
    robot: SimulatedRobot,
    /// Id of the next report
    frame_id: u8,
    /// A status request waits for its report
    request_pending: bool,
}

impl SimulationTransport {
    /// Create a new simulation transport instance.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            open: false,
            robot: SimulatedRobot::new(),
            frame_id: 0,
            request_pending: false,
        }
    }

    /// Simulated robot.
    pub fn robot(&self) -> &SimulatedRobot {
        &self.robot
    }

    fn route(&mut self, report: &SendReport) {
        let mut frame: Frame = [0; FRAME_LEN];
        frame.copy_from_slice(&report[1..]);
        match report[0] {
            r if r == Route::Tux as u8 => self.robot.apply_tux(&frame),
            r if r == Route::Dongle as u8 => self.robot.apply_dongle(&frame),
            other => debug!("Simulated dongle ignores route {}", other),
        }
    }
}

impl Default for SimulationTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulationTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn open(&mut self, vendor_id: u16, product_id: u16) -> Result<(), TransportError> {
        if self.open {
            return Err(TransportError::AlreadyStarted);
        }
        if (vendor_id, product_id) != (TUX_VID, TUX_PID) {
            return Err(TransportError::DeviceNotFound(format!(
                "{vendor_id:04x}:{product_id:04x}"
            )));
        }
        info!("Simulated dongle opened");
        self.robot = SimulatedRobot::new();
        self.request_pending = false;
        self.open = true;
        Ok(())
    }

    fn write(&mut self, report: &SendReport) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        if *report == STATUS_REQUEST_REPORT {
            self.request_pending = true;
        } else if *report == RESET_RF_REPORT || *report == RESET_DONGLE_REPORT {
            debug!("Simulated dongle reset");
        } else {
            self.route(report);
        }
        Ok(())
    }

    fn read(&mut self, report: &mut ReceiveReport) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        report.fill(0);
        if !std::mem::take(&mut self.request_pending) {
            return Ok(0);
        }
        let frames = self.robot.tick();
        report[0] = self.frame_id;
        report[1] = u8::from(self.robot.rf_online());
        report[3] = frames.len() as u8;
        for (chunk, frame) in report[REPORT_HEADER_LEN..]
            .chunks_exact_mut(FRAME_LEN)
            .zip(&frames)
        {
            chunk.copy_from_slice(frame);
        }
        self.frame_id = self.frame_id.wrapping_add(1);
        Ok(report.len())
    }

    fn close(&mut self) {
        if self.open {
            info!("Simulated dongle closed");
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tux_common::consts::RECEIVE_LEN;
    use tux_common::protocol::frame::FrameHeader;
    use tux_common::protocol::opcodes::EYES_BLINK;

    fn opened() -> SimulationTransport {
        let mut transport = SimulationTransport::new();
        transport.open(TUX_VID, TUX_PID).unwrap();
        transport
    }

    #[test]
    fn open_checks_identifiers() {
        let mut transport = SimulationTransport::new();
        assert!(matches!(
            transport.open(0x1234, 0x5678),
            Err(TransportError::DeviceNotFound(_))
        ));
        transport.open(TUX_VID, TUX_PID).unwrap();
        assert_eq!(
            transport.open(TUX_VID, TUX_PID),
            Err(TransportError::AlreadyStarted)
        );
    }

    #[test]
    fn status_request_produces_report() {
        let mut transport = opened();
        let mut report = [0u8; RECEIVE_LEN];
        assert_eq!(transport.read(&mut report), Ok(0));

        transport.write(&STATUS_REQUEST_REPORT).unwrap();
        assert_eq!(transport.read(&mut report), Ok(RECEIVE_LEN));
        assert_eq!(report[1], 1);
        assert!(report[3] >= 5);
        assert_eq!(report[4], FrameHeader::Ports as u8);
    }

    #[test]
    fn commands_reach_the_robot() {
        let mut transport = opened();
        transport.write(&[0, EYES_BLINK, 3, 0, 0]).unwrap();
        transport.write(&STATUS_REQUEST_REPORT).unwrap();
        let mut report = [0u8; RECEIVE_LEN];
        transport.read(&mut report).unwrap();
        assert_eq!(transport.robot().eyes.remaining, 2);
    }

    #[test]
    fn closed_transport_refuses_io() {
        let mut transport = opened();
        transport.close();
        assert_eq!(
            transport.write(&STATUS_REQUEST_REPORT),
            Err(TransportError::NotConnected)
        );
    }
}
