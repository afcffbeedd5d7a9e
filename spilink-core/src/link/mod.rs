//! Shared link handle
//!
//! [`SpiLink`] is created once at start-up and lives for the rest of the
//! program. Interrupt handlers reach it through a `&'static` registered
//! during initialization; the main loop uses the same reference.

pub mod handle;
pub mod receiver;

pub use handle::SpiLink;
