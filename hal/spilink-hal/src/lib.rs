//! spilink Hardware Abstraction Layer
//!
//! This crate defines the hardware seams the SPI slave transport needs.
//! Chip-specific code implements them; the transport logic in
//! `spilink-core` only ever sees these traits, which keeps it testable on
//! the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (spilink-firmware, etc.)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  spilink-core (framing, idle detection) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  spilink-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`spi::SpiSlave`] - Byte-at-a-time SPI slave peripheral
//! - [`timer::TickSource`] - Low-frequency periodic tick used for idle detection
//! - [`timer::MillisClock`] - Millisecond timestamp source

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod gpio;
pub mod spi;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use gpio::{InputPin, OutputPin};
pub use spi::{Mode, Phase, Polarity, SpiSlave, SpiSlaveConfig};
pub use timer::{MillisClock, TickSource};
