//! Interrupt-driven SPI slave transport
//!
//! This crate holds everything between the SPI peripheral and the
//! application's main loop:
//!
//! - Receive ring shared by the interrupt handler and the main loop
//! - Chip-select edge handling and idle (host silence) detection
//! - Per-byte receive handler that frames messages and stages replies
//! - The [`SpiLink`] handle the application and interrupt handlers share
//!
//! Nothing here allocates or blocks. Interrupt-side entry points are
//! `on_*` methods on [`SpiLink`]; all other methods are for the main loop.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bus;
pub mod channel;
pub mod config;
pub mod fault;
pub mod link;

#[cfg(test)]
mod mock;

pub use bus::{BusEdge, BusMonitor, IdleTimer};
pub use channel::{ByteChannel, ChannelFull, ChannelReader};
pub use config::{ChipSelectPolarity, ConfigError, LinkConfig, DEFAULT_CAPACITY};
pub use fault::LinkFaults;
pub use link::SpiLink;
