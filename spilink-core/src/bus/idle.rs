//! Idle detection
//!
//! Counts low-frequency ticks while the bus is deselected. After the
//! threshold is reached the timed-out flag is raised and the tick source
//! switched off until the next deselect re-arms it.

use portable_atomic::{AtomicBool, AtomicU8, Ordering};
use spilink_hal::TickSource;

use super::monitor::BusMonitor;

/// Host-silence countdown
pub struct IdleTimer {
    threshold: u8,
    ticks: AtomicU8,
    armed: AtomicBool,
    timed_out: AtomicBool,
}

impl IdleTimer {
    /// Create a disarmed timer firing after `threshold` ticks
    pub const fn new(threshold: u8) -> Self {
        Self {
            threshold,
            ticks: AtomicU8::new(0),
            armed: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
        }
    }

    /// Ticks needed to time out
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Ticks counted since the timer was last armed
    pub fn elapsed_ticks(&self) -> u8 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Check if ticks are being counted
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Check if the host has been silent for the full threshold
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Acquire)
    }

    /// Restart the countdown and enable the tick source
    pub fn arm<T: TickSource>(&self, tick: &mut T) {
        self.ticks.store(0, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
        tick.set_tick_enabled(true);
    }

    /// Clear the timed-out flag (reselect)
    pub fn clear_timeout(&self) {
        self.timed_out.store(false, Ordering::Release);
    }

    /// Handle one tick
    ///
    /// Does nothing while selected, before the first deselect, or once the
    /// timer has fired. Returns `true` on the tick that raises the flag.
    pub fn on_tick<T: TickSource>(&self, bus: &BusMonitor, tick: &mut T) -> bool {
        if bus.is_selected() || bus.deselected_at_ms().is_none() {
            return false;
        }
        if !self.armed.load(Ordering::Acquire) {
            return false;
        }

        let elapsed = self.ticks.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        if elapsed < self.threshold {
            return false;
        }

        self.timed_out.store(true, Ordering::Release);
        self.armed.store(false, Ordering::Release);
        tick.set_tick_enabled(false);
        true
    }
}
