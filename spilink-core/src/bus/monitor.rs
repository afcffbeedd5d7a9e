//! Chip-select edge monitor
//!
//! Tracks whether the host has the device selected. On deselect the byte
//! interrupt is switched off and the idle timer armed; on reselect the
//! timeout is cleared and the byte interrupt switched back on.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use spilink_hal::{InputPin, MillisClock, SpiSlave, TickSource};

use super::idle::IdleTimer;
use crate::config::ChipSelectPolarity;

/// Direction of a chip-select edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEdge {
    /// Host selected the device
    Selected,
    /// Host released the device
    Deselected,
}

/// Result of handling one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeOutcome {
    /// Which way the bus went
    pub edge: BusEdge,
    /// The toggled state disagreed with the pin level (an edge was missed)
    pub desync: bool,
}

/// Selection state written only by the chip-select edge handler
pub struct BusMonitor {
    polarity: ChipSelectPolarity,
    selected: AtomicBool,
    /// Set once the first deselect has been seen
    ever_deselected: AtomicBool,
    deselected_at_ms: AtomicU32,
}

impl BusMonitor {
    /// Create a monitor; the bus starts out deselected
    pub const fn new(polarity: ChipSelectPolarity) -> Self {
        Self {
            polarity,
            selected: AtomicBool::new(false),
            ever_deselected: AtomicBool::new(false),
            deselected_at_ms: AtomicU32::new(0),
        }
    }

    /// Check if the host currently has the device selected
    pub fn is_selected(&self) -> bool {
        self.selected.load(Ordering::Acquire)
    }

    /// When the host last released the device, if it ever has
    pub fn deselected_at_ms(&self) -> Option<u32> {
        if self.ever_deselected.load(Ordering::Acquire) {
            Some(self.deselected_at_ms.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Handle one chip-select edge
    ///
    /// Toggles the selection state. The pin is read to decide the edge
    /// direction; if the toggle disagrees with it the state follows the
    /// pin and the outcome is flagged as a desync.
    pub fn on_edge<P, S, T, C>(
        &self,
        chip_select: &P,
        spi: &mut S,
        idle: &IdleTimer,
        tick: &mut T,
        clock: &C,
    ) -> EdgeOutcome
    where
        P: InputPin,
        S: SpiSlave,
        T: TickSource,
        C: MillisClock,
    {
        let toggled = !self.selected.load(Ordering::Relaxed);
        let asserted = self.polarity.is_asserted(chip_select.is_high());
        self.selected.store(asserted, Ordering::Release);

        let edge = if asserted {
            idle.clear_timeout();
            spi.set_byte_event_enabled(true);
            BusEdge::Selected
        } else {
            spi.set_byte_event_enabled(false);
            self.deselected_at_ms.store(clock.now_ms(), Ordering::Relaxed);
            self.ever_deselected.store(true, Ordering::Release);
            idle.arm(tick);
            BusEdge::Deselected
        };

        EdgeOutcome {
            edge,
            desync: toggled != asserted,
        }
    }
}
