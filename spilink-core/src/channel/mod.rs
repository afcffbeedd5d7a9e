//! Receive channel
//!
//! Bounded single-producer/single-consumer byte ring. The receive
//! interrupt appends at the back; the main loop peeks and pops at the
//! front.

pub mod ring;

pub use ring::{ByteChannel, ChannelFull, ChannelReader};
