//! USB link layer.
//!
//! Owns the transport and the connection flags, writes routed reports and
//! runs one polling exchange per cycle: status request, report read, report
//! decoding with anomaly detection. Connection callbacks are not fired here;
//! the caller learns from [`SendError::Lost`] and [`PollEvent::Lost`] that
//! the link just went down.

use heapless::Vec as HVec;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tux_common::config::{MonitorConfig, UsbConfig};
use tux_common::consts::{FRAME_LEN, MAX_FRAMES_PER_REPORT, RECEIVE_LEN, REPORT_HEADER_LEN};
use tux_common::protocol::frame::Frame;
use tux_common::protocol::opcodes::{
    EYES_BLINK, RESET_DONGLE_REPORT, RESET_RF_REPORT, Route, STATUS_REQUEST_REPORT,
};
use tux_common::transport::{ReceiveReport, SendReport, Transport, TransportError};

/// Report sent to the robot when the dongle keeps returning empty reports.
pub const UNSTICK_REPORT: SendReport = [Route::Tux as u8, EYES_BLINK, 2, 0, 0];

/// Failure of an outbound write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The link was already down.
    NotConnected,
    /// The write failed and this call took the link down.
    Lost(TransportError),
}

/// Result of one polling exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// A report was decoded.
    Report(ReportAction),
    /// The exchange failed and the link went down.
    Lost,
    /// The link was already down.
    NotConnected,
}

/// What a decoded polling report asks of the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportAction {
    /// New RF state, when it changed.
    pub rf_change: Option<bool>,
    /// Status frames to dispatch, in report order.
    pub frames: HVec<Frame, MAX_FRAMES_PER_REPORT>,
    /// Corrective report to write.
    pub corrective: Option<SendReport>,
}

/// Polling report decoder and anomaly detector.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    config: MonitorConfig,
    last_frame_id: Option<u8>,
    frozen_count: u32,
    empty_count: u32,
    last_rf_state: u8,
}

impl LinkMonitor {
    /// Decoder with cleared counters.
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            config: config.clone(),
            last_frame_id: None,
            frozen_count: 0,
            empty_count: 0,
            last_rf_state: 0,
        }
    }

    /// Clear counters, as on a new capture.
    pub fn reset(&mut self) {
        self.last_frame_id = None;
        self.frozen_count = 0;
        self.empty_count = 0;
        self.last_rf_state = 0;
    }

    /// Consecutive empty reports seen with the RF link online.
    pub fn empty_count(&self) -> u32 {
        self.empty_count
    }

    /// Decode one polling report.
    pub fn process(&mut self, report: &ReceiveReport) -> ReportAction {
        let mut action = ReportAction::default();
        let frame_id = report[0];
        let rf_state = report[1];
        let packet_count = usize::from(report[3]);

        if self.config.check_frame_id {
            if self.last_frame_id == Some(frame_id) {
                self.frozen_count += 1;
                warn!(
                    "The id of USB frame is the same than the previous [{}]",
                    self.frozen_count
                );
                if self.frozen_count >= self.config.frozen_frame_limit {
                    self.frozen_count = 0;
                    self.last_frame_id = None;
                    error!(
                        "The USB frame retrieving seems to be frozen [{}]",
                        self.config.frozen_frame_limit
                    );
                    info!("The RF connection will be reinitialized");
                    action.corrective = Some(RESET_RF_REPORT);
                }
                return action;
            }
            self.frozen_count = 0;
            self.last_frame_id = Some(frame_id);
        }

        if packet_count == 0 && rf_state == 1 {
            self.empty_count += 1;
            if self.empty_count > 2 {
                warn!("Consecutive frames without status : {}", self.empty_count);
            }
            if self.empty_count >= self.config.empty_frame_limit {
                error!(
                    "DONGLE ERROR : Too many consecutive frames without status [{}], but the RF is online",
                    self.config.empty_frame_limit
                );
                self.empty_count = 0;
                info!("Send a command to the eyes.");
                action.corrective = Some(UNSTICK_REPORT);
            }
        } else {
            self.empty_count = 0;
        }

        if rf_state != self.last_rf_state {
            self.last_rf_state = rf_state;
            action.rf_change = Some(rf_state != 0);
        }

        if packet_count > MAX_FRAMES_PER_REPORT {
            error!("DONGLE ERROR : Statuses packets count is wrong (>15)");
            return action;
        }

        for chunk in report[REPORT_HEADER_LEN..]
            .chunks_exact(FRAME_LEN)
            .take(packet_count)
        {
            let mut frame = [0u8; FRAME_LEN];
            frame.copy_from_slice(chunk);
            // capacity equals the packet count bound checked above
            let _ = action.frames.push(frame);
        }
        action
    }
}

/// Connection to the dongle.
pub struct UsbLink {
    transport: Mutex<Box<dyn Transport>>,
    monitor: Mutex<LinkMonitor>,
    connected: AtomicBool,
    rf_online: AtomicBool,
    vendor_id: u16,
    product_id: u16,
}

impl UsbLink {
    /// Link over `transport`, not yet captured.
    pub fn new(transport: Box<dyn Transport>, usb: &UsbConfig, monitor: &MonitorConfig) -> Self {
        Self {
            transport: Mutex::new(transport),
            monitor: Mutex::new(LinkMonitor::new(monitor)),
            connected: AtomicBool::new(false),
            rf_online: AtomicBool::new(false),
            vendor_id: usb.vendor_id,
            product_id: usb.product_id,
        }
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &'static str {
        self.transport.lock().name()
    }

    /// Open the device and mark the link connected.
    ///
    /// # Errors
    /// The transport's error when the device cannot be opened.
    pub fn capture(&self) -> Result<(), TransportError> {
        {
            let mut transport = self.transport.lock();
            if !transport.is_open() {
                transport.open(self.vendor_id, self.product_id)?;
            }
        }
        self.monitor.lock().reset();
        self.rf_online.store(false, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Close the device. Returns whether the link was connected.
    pub fn release(&self) -> bool {
        let was_connected = self.connected.swap(false, Ordering::SeqCst);
        self.rf_online.store(false, Ordering::SeqCst);
        self.transport.lock().close();
        was_connected
    }

    /// Whether a device is captured.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether the radio link with the robot is up.
    #[inline]
    pub fn rf_online(&self) -> bool {
        self.rf_online.load(Ordering::SeqCst)
    }

    /// Record the radio link state.
    #[inline]
    pub fn set_rf_online(&self, online: bool) {
        self.rf_online.store(online, Ordering::SeqCst);
    }

    /// Write a complete report.
    ///
    /// # Errors
    /// [`SendError::Lost`] when the write failed; the link is then released.
    pub fn send_raw(&self, report: &SendReport) -> Result<(), SendError> {
        if !self.is_connected() {
            return Err(SendError::NotConnected);
        }
        let result = self.transport.lock().write(report);
        result.map_err(|e| {
            error!("Failed to write on the USB device: {}", e);
            if self.release() {
                SendError::Lost(e)
            } else {
                SendError::NotConnected
            }
        })
    }

    /// Write a frame routed to the robot.
    pub fn send_to_tux(&self, frame: &Frame) -> Result<(), SendError> {
        self.send_routed(Route::Tux, frame)
    }

    /// Write a frame routed to the dongle.
    pub fn send_to_dongle(&self, frame: &Frame) -> Result<(), SendError> {
        self.send_routed(Route::Dongle, frame)
    }

    fn send_routed(&self, route: Route, frame: &Frame) -> Result<(), SendError> {
        let mut report = [0u8; 5];
        report[0] = route as u8;
        report[1..].copy_from_slice(frame);
        self.send_raw(&report)
    }

    /// Reset the dongle.
    pub fn reset_dongle(&self) -> Result<(), SendError> {
        self.send_raw(&RESET_DONGLE_REPORT)
    }

    /// Reset the radio link.
    pub fn reset_rf(&self) -> Result<(), SendError> {
        self.send_raw(&RESET_RF_REPORT)
    }

    /// One polling exchange.
    pub fn poll(&self) -> PollEvent {
        match self.send_raw(&STATUS_REQUEST_REPORT) {
            Ok(()) => {}
            Err(SendError::Lost(_)) => return PollEvent::Lost,
            Err(SendError::NotConnected) => return PollEvent::NotConnected,
        }

        let mut report: ReceiveReport = [0; RECEIVE_LEN];
        let read = self.transport.lock().read(&mut report);
        if let Err(e) = read {
            error!("Failed to read on the USB device: {}", e);
            if let Err(e) = self.transport.lock().write(&RESET_DONGLE_REPORT) {
                warn!("Dongle reset after failed read not sent: {}", e);
            }
            return if self.release() {
                PollEvent::Lost
            } else {
                PollEvent::NotConnected
            };
        }

        let action = self.monitor.lock().process(&report);
        if let Some(corrective) = action.corrective {
            match self.send_raw(&corrective) {
                Err(SendError::Lost(_)) => return PollEvent::Lost,
                Err(SendError::NotConnected) => return PollEvent::NotConnected,
                Ok(()) => {}
            }
        }
        PollEvent::Report(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn monitor(check_frame_id: bool) -> LinkMonitor {
        LinkMonitor::new(&MonitorConfig {
            check_frame_id,
            ..MonitorConfig::default()
        })
    }

    fn report(id: u8, rf: u8, frames: &[Frame]) -> ReceiveReport {
        let mut r = [0u8; RECEIVE_LEN];
        r[0] = id;
        r[1] = rf;
        r[3] = frames.len() as u8;
        for (i, f) in frames.iter().enumerate() {
            r[4 + i * 4..8 + i * 4].copy_from_slice(f);
        }
        r
    }

    // ─── Report decoding ────────────────────────────────────────────

    #[test]
    fn frames_and_rf_change_are_extracted() {
        let mut m = monitor(false);
        let action = m.process(&report(1, 1, &[[0xC0, 1, 2, 3], [0xC7, 4, 5, 6]]));
        assert_eq!(action.rf_change, Some(true));
        assert_eq!(action.frames.as_slice(), &[[0xC0, 1, 2, 3], [0xC7, 4, 5, 6]]);

        let action = m.process(&report(2, 1, &[[0xC0, 1, 2, 3]]));
        assert_eq!(action.rf_change, None);
    }

    #[test]
    fn oversized_packet_count_drops_frames() {
        let mut m = monitor(false);
        let mut r = report(1, 1, &[]);
        r[3] = 16;
        let action = m.process(&r);
        assert!(action.frames.is_empty());
        assert_eq!(action.rf_change, Some(true));
    }

    #[test]
    fn empty_reports_trigger_unstick() {
        let mut m = monitor(false);
        for _ in 0..19 {
            assert_eq!(m.process(&report(0, 1, &[])).corrective, None);
        }
        assert_eq!(m.process(&report(0, 1, &[])).corrective, Some(UNSTICK_REPORT));
        assert_eq!(m.empty_count(), 0);

        m.process(&report(0, 1, &[]));
        m.process(&report(0, 1, &[[0xC0, 0, 0, 0]]));
        assert_eq!(m.empty_count(), 0);
    }

    #[test]
    fn empty_reports_with_rf_offline_are_normal() {
        let mut m = monitor(false);
        for _ in 0..30 {
            assert_eq!(m.process(&report(0, 0, &[])).corrective, None);
        }
        assert_eq!(m.empty_count(), 0);
    }

    #[test]
    fn frozen_frame_id_resets_rf() {
        let mut m = monitor(true);
        m.process(&report(7, 1, &[[0xC0, 0, 0, 0]]));
        for _ in 0..9 {
            let action = m.process(&report(7, 1, &[[0xC0, 0, 0, 0]]));
            assert!(action.frames.is_empty());
            assert_eq!(action.corrective, None);
        }
        let action = m.process(&report(7, 1, &[[0xC0, 0, 0, 0]]));
        assert_eq!(action.corrective, Some(RESET_RF_REPORT));
        // the next report is accepted whatever its id
        assert_eq!(m.process(&report(7, 1, &[[0xC0, 0, 0, 0]])).frames.len(), 1);
    }

    // ─── Link ───────────────────────────────────────────────────────

    #[derive(Default)]
    struct Shared {
        written: Vec<SendReport>,
        fail_writes: bool,
        fail_reads: bool,
        unplug_on_read: bool,
    }

    struct FakeTransport {
        shared: Arc<parking_lot::Mutex<Shared>>,
        open: bool,
    }

    impl Transport for FakeTransport {
        fn name(&self) -> &'static str {
            "fake"
        }
        fn version(&self) -> &'static str {
            "0.0.0"
        }
        fn open(&mut self, _vid: u16, _pid: u16) -> Result<(), TransportError> {
            self.open = true;
            Ok(())
        }
        fn write(&mut self, report: &SendReport) -> Result<(), TransportError> {
            let mut shared = self.shared.lock();
            if shared.fail_writes {
                return Err(TransportError::Disconnected);
            }
            shared.written.push(*report);
            Ok(())
        }
        fn read(&mut self, report: &mut ReceiveReport) -> Result<usize, TransportError> {
            let mut shared = self.shared.lock();
            if shared.unplug_on_read {
                shared.fail_writes = true;
                return Err(TransportError::Disconnected);
            }
            if shared.fail_reads {
                return Err(TransportError::Io("stall".into()));
            }
            report[1] = 1;
            report[3] = 1;
            report[4..8].copy_from_slice(&[0xC2, 0, 0x10, 0]);
            Ok(RECEIVE_LEN)
        }
        fn close(&mut self) {
            self.open = false;
        }
        fn is_open(&self) -> bool {
            self.open
        }
    }

    fn link() -> (UsbLink, Arc<parking_lot::Mutex<Shared>>) {
        let shared = Arc::new(parking_lot::Mutex::new(Shared::default()));
        let transport = FakeTransport {
            shared: Arc::clone(&shared),
            open: false,
        };
        let link = UsbLink::new(
            Box::new(transport),
            &UsbConfig::default(),
            &MonitorConfig::default(),
        );
        (link, shared)
    }

    #[test]
    fn routed_frames_get_prefix() {
        let (link, shared) = link();
        assert_eq!(link.send_to_tux(&[1, 2, 3, 4]), Err(SendError::NotConnected));
        link.capture().unwrap();
        link.send_to_tux(&[0x33, 0, 0, 0]).unwrap();
        link.send_to_dongle(&[0, 3, 0, 0]).unwrap();
        assert_eq!(
            shared.lock().written,
            vec![[0, 0x33, 0, 0, 0], [1, 0, 3, 0, 0]]
        );
    }

    #[test]
    fn poll_requests_status_then_decodes() {
        let (link, shared) = link();
        link.capture().unwrap();
        match link.poll() {
            PollEvent::Report(action) => {
                assert_eq!(action.rf_change, Some(true));
                assert_eq!(action.frames.as_slice(), &[[0xC2, 0, 0x10, 0]]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(shared.lock().written, vec![STATUS_REQUEST_REPORT]);
    }

    #[test]
    fn write_failure_drops_link_once() {
        let (link, shared) = link();
        link.capture().unwrap();
        shared.lock().fail_writes = true;
        assert!(matches!(link.send_to_tux(&[0; 4]), Err(SendError::Lost(_))));
        assert!(!link.is_connected());
        assert_eq!(link.send_to_tux(&[0; 4]), Err(SendError::NotConnected));
        assert_eq!(link.poll(), PollEvent::NotConnected);
    }

    #[test]
    fn read_failure_resets_dongle_and_drops_link() {
        let (link, shared) = link();
        link.capture().unwrap();
        shared.lock().fail_reads = true;
        assert_eq!(link.poll(), PollEvent::Lost);
        assert!(!link.is_connected());
        assert_eq!(
            shared.lock().written,
            vec![STATUS_REQUEST_REPORT, RESET_DONGLE_REPORT]
        );
    }

    #[test]
    fn unplug_during_read_still_drops_link() {
        let (link, shared) = link();
        link.capture().unwrap();
        shared.lock().unplug_on_read = true;
        assert_eq!(link.poll(), PollEvent::Lost);
        assert!(!link.is_connected());
        assert_eq!(shared.lock().written, vec![STATUS_REQUEST_REPORT]);
    }
}
