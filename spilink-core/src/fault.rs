//! Fault counters
//!
//! Nothing on the link is fatal. Conditions that lose or mangle data are
//! counted so the application can report them.

use portable_atomic::{AtomicU16, Ordering};

/// Snapshot of the fault counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkFaults {
    /// Messages skipped because the receive channel had no room for them
    pub overflows: u16,
    /// Frames discarded because their SIZE could not cover the method byte
    pub malformed: u16,
    /// Chip-select edges that disagreed with the pin level
    pub select_desyncs: u16,
}

impl LinkFaults {
    /// Check if no fault has been recorded
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Saturating counters updated from either context
pub(crate) struct FaultCounters {
    overflows: AtomicU16,
    malformed: AtomicU16,
    select_desyncs: AtomicU16,
}

impl FaultCounters {
    pub(crate) const fn new() -> Self {
        Self {
            overflows: AtomicU16::new(0),
            malformed: AtomicU16::new(0),
            select_desyncs: AtomicU16::new(0),
        }
    }

    fn bump(counter: &AtomicU16) {
        let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1));
    }

    pub(crate) fn record_overflow(&self) {
        Self::bump(&self.overflows);
    }

    pub(crate) fn record_malformed(&self) {
        Self::bump(&self.malformed);
    }

    pub(crate) fn record_select_desync(&self) {
        Self::bump(&self.select_desyncs);
    }

    pub(crate) fn snapshot(&self) -> LinkFaults {
        LinkFaults {
            overflows: self.overflows.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            select_desyncs: self.select_desyncs.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn take(&self) -> LinkFaults {
        LinkFaults {
            overflows: self.overflows.swap(0, Ordering::Relaxed),
            malformed: self.malformed.swap(0, Ordering::Relaxed),
            select_desyncs: self.select_desyncs.swap(0, Ordering::Relaxed),
        }
    }
}
