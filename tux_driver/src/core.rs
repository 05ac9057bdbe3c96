//! Driver core and polling loop.
//!
//! The `TuxCore` struct owns the read loop: it captures the dongle, runs one
//! polling cycle per read interval, and retries the capture after every
//! disconnect until shutdown is requested.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::context::DriverContext;

/// Driver core running the polling loop over a shared context.
pub struct TuxCore {
    /// Shared driver state
    context: Arc<DriverContext>,
    /// Running flag, cleared to stop the loop
    running: Arc<AtomicBool>,
    /// Polling period
    read_interval: Duration,
    /// Delay between two capture attempts
    reconnect_delay: Duration,
    /// Loop statistics
    stats: LoopStats,
}

/// Statistics for read loop monitoring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    /// Number of polling cycles executed
    pub cycle_count: u64,
    /// Number of cycles that overran the read interval
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Number of successful dongle captures
    pub connections: u64,
}

/// Outcome of one [`TuxCore::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A polling cycle ran.
    Polled,
    /// The dongle was captured.
    Connected,
    /// No dongle, or the link went down.
    Offline,
}

impl TuxCore {
    /// Create a core over `context` with the intervals of its configuration.
    pub fn new(context: Arc<DriverContext>) -> Self {
        let usb = &context.config().usb;
        let read_interval = Duration::from_millis(usb.read_interval_ms);
        let reconnect_delay = Duration::from_millis(usb.reconnect_delay_ms);
        info!(
            "TuxCore created (read_interval={}ms, reconnect_delay={}ms)",
            usb.read_interval_ms, usb.reconnect_delay_ms
        );
        Self {
            context,
            running: Arc::new(AtomicBool::new(true)),
            read_interval,
            reconnect_delay,
            stats: LoopStats::default(),
        }
    }

    /// Shared driver context.
    pub fn context(&self) -> &Arc<DriverContext> {
        &self.context
    }

    /// Capture the dongle if needed, otherwise run one polling cycle.
    pub fn step(&mut self) -> StepOutcome {
        let link = self.context.link();
        if !link.is_connected() {
            return match link.capture() {
                Ok(()) => {
                    self.stats.connections += 1;
                    self.context.on_connect();
                    StepOutcome::Connected
                }
                Err(e) => {
                    debug!("Dongle not captured: {}", e);
                    StepOutcome::Offline
                }
            };
        }
        self.stats.cycle_count += 1;
        if self.context.read_cycle() {
            StepOutcome::Polled
        } else {
            StepOutcome::Offline
        }
    }

    /// Run the read loop.
    ///
    /// This method blocks until the running flag is cleared.
    pub fn run(&mut self) {
        info!(
            "Starting read loop (read_interval={}ms)...",
            self.read_interval.as_millis()
        );

        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let outcome = self.step();

            let period = match outcome {
                StepOutcome::Polled | StepOutcome::Connected => self.read_interval,
                StepOutcome::Offline => self.reconnect_delay,
            };

            if outcome == StepOutcome::Polled {
                let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
                self.stats.max_cycle_time_us = self.stats.max_cycle_time_us.max(cycle_time_us);
                if cycle_time_us > self.read_interval.as_micros() as u64 {
                    self.stats.timing_violations += 1;
                    if self.stats.timing_violations <= 10
                        || self.stats.timing_violations % 1000 == 0
                    {
                        warn!(
                            "Timing violation #{}: cycle took {}us (target {}us)",
                            self.stats.timing_violations,
                            cycle_time_us,
                            self.read_interval.as_micros()
                        );
                    }
                }
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < period {
                std::thread::sleep(period - elapsed);
            }
        }

        info!(
            "Read loop stopped after {} cycles (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
    }

    /// Request shutdown of the read loop and release the dongle.
    pub fn shutdown(&mut self) {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);
        if self.context.link().release() {
            self.context.on_disconnect();
        }
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Get loop statistics.
    pub fn stats(&self) -> LoopStats {
        self.stats
    }
}
