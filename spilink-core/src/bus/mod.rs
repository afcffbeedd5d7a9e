//! Bus state
//!
//! Chip-select edge handling and idle detection. Both run in interrupt
//! context; the main loop only reads the flags they publish.

pub mod idle;
pub mod monitor;

pub use idle::IdleTimer;
pub use monitor::{BusEdge, BusMonitor, EdgeOutcome};
