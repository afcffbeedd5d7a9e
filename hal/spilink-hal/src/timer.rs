//! Timing abstractions

/// Periodic low-frequency tick (watchdog interrupt, RTC wakeup, ...)
///
/// The idle timer switches the tick off once it has fired and the bus
/// edge monitor switches it back on at the next deselect.
pub trait TickSource {
    /// Enable or disable delivery of tick events
    fn set_tick_enabled(&mut self, enabled: bool);
}

/// Monotonic millisecond clock
pub trait MillisClock {
    /// Milliseconds since boot, wrapping
    fn now_ms(&self) -> u32;
}
