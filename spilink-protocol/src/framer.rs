//! Incremental framing state machine
//!
//! [`Framer::feed`] advances by exactly one byte and never loops, so it can
//! run inside the byte-received interrupt.

use crate::frame::{normalize_size_byte, METHOD_INTERNAL_PING, SENTINEL};

/// Where the framer is within the current message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingState {
    /// Discarding bytes until a sentinel arrives
    AwaitingSentinel,
    /// Got the sentinel, next byte is SIZE
    SawSentinel,
    /// Got SIZE, next byte is METHOD
    SawSize,
    /// Reading payload bytes
    AwaitingBody,
}

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Feed {
    /// Byte to keep for the consumer, `None` if it was garbage.
    /// The SIZE byte is passed on normalized.
    pub byte: Option<u8>,
    /// This byte was the method byte of a ping
    pub ping: bool,
    /// This byte completed a message
    pub complete: bool,
}

/// Byte-at-a-time framing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Framer {
    state: FramingState,
    /// Bytes still expected for the current message.
    /// Non-zero in `SawSize` and `AwaitingBody`.
    remaining: u8,
    /// The message in progress is being skipped, see [`Framer::discard_frame`]
    discarding: bool,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Create a framer waiting for a sentinel
    pub const fn new() -> Self {
        Self {
            state: FramingState::AwaitingSentinel,
            remaining: 0,
            discarding: false,
        }
    }

    /// Current state
    pub fn state(&self) -> FramingState {
        self.state
    }

    /// Bytes still expected before the current message completes
    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Check whether the framer is between messages
    pub fn is_idle(&self) -> bool {
        self.state == FramingState::AwaitingSentinel
    }

    /// Check whether the message in progress is being skipped
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Drop any partial message
    pub fn reset(&mut self) {
        self.state = FramingState::AwaitingSentinel;
        self.remaining = 0;
        self.discarding = false;
    }

    /// Skip the rest of the message in progress
    ///
    /// Its remaining bytes still advance the state machine, so the next
    /// sentinel is found at the right place, but none of them is kept,
    /// flagged as a ping or reported as completing a message. No effect
    /// between messages.
    pub fn discard_frame(&mut self) {
        if !self.is_idle() {
            self.discarding = true;
        }
    }

    /// Feed a single byte to the framer
    pub fn feed(&mut self, byte: u8) -> Feed {
        let feed = self.step(byte);
        if !self.discarding {
            return feed;
        }
        if self.is_idle() {
            self.discarding = false;
        }
        Feed::default()
    }

    fn step(&mut self, byte: u8) -> Feed {
        match self.state {
            FramingState::AwaitingSentinel => {
                if byte != SENTINEL {
                    return Feed::default();
                }
                self.state = FramingState::SawSentinel;
                Feed {
                    byte: Some(byte),
                    ..Feed::default()
                }
            }
            FramingState::SawSentinel => {
                let size = normalize_size_byte(byte);
                // SIZE has been read, so size - 1 bytes are left
                if size > 1 {
                    self.remaining = size - 1;
                    self.state = FramingState::SawSize;
                    Feed {
                        byte: Some(size),
                        ..Feed::default()
                    }
                } else {
                    self.reset();
                    Feed {
                        byte: Some(size),
                        ping: false,
                        complete: true,
                    }
                }
            }
            FramingState::SawSize => {
                let ping = byte == METHOD_INTERNAL_PING;
                let complete = self.consume_one();
                if !complete {
                    self.state = FramingState::AwaitingBody;
                }
                Feed {
                    byte: Some(byte),
                    ping,
                    complete,
                }
            }
            FramingState::AwaitingBody => {
                let complete = self.consume_one();
                Feed {
                    byte: Some(byte),
                    ping: false,
                    complete,
                }
            }
        }
    }

    /// Count one message byte, returning to `AwaitingSentinel` when done
    fn consume_one(&mut self) -> bool {
        self.remaining -= 1;
        if self.remaining == 0 {
            self.state = FramingState::AwaitingSentinel;
            true
        } else {
            false
        }
    }
}
