//! spilink message framing
//!
//! A host clocks bytes into the device one SPI transfer at a time. This
//! crate turns that byte stream back into messages.
//!
//! # Wire format
//!
//! ```text
//! ┌──────────┬──────┬────────┬──────────────────┐
//! │ SENTINEL │ SIZE │ METHOD │ PAYLOAD          │
//! │ 'm'      │ 1B   │ 1B     │ SIZE - 2 bytes   │
//! └──────────┴──────┴────────┴──────────────────┘
//! ```
//!
//! `SIZE` counts itself, the method byte and the payload, but not the
//! sentinel. An ASCII digit in the size position is read as its numeric
//! value so a message can be typed by hand from a serial bridge.
//!
//! Two ways of finding message boundaries are provided:
//!
//! - [`Framer`] consumes one byte at a time and keeps its state between
//!   calls. This is the authoritative path and is cheap enough to run in
//!   the byte-received interrupt.
//! - [`has_complete_message`] re-derives framing by peeking at whatever
//!   is buffered in a [`ByteQueue`], independent of any framer state.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod framer;
pub mod scan;

pub use frame::{
    normalize_size_byte, FrameError, Message, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
    METHOD_INTERNAL_BASE, METHOD_INTERNAL_PING, PING_BYTES_TO_HAVE_FREE, SENTINEL,
};
pub use framer::{Feed, Framer, FramingState};
pub use scan::{has_complete_message, read_message, ByteQueue};
