//! Byte-received interrupt path
//!
//! Runs once per SPI transfer, so everything here is constant time: one
//! framer step, at most one push, and a register write.

use portable_atomic::Ordering;
use spilink_hal::SpiSlave;
use spilink_protocol::{Feed, FramingState};

use super::handle::SpiLink;

impl<const N: usize> SpiLink<N> {
    /// Byte-received interrupt handler
    ///
    /// Ignored while deselected, which covers a completion that races the
    /// byte interrupt being switched off.
    pub fn on_transfer_complete<S: SpiSlave>(&self, spi: &mut S) {
        if !self.bus.is_selected() {
            return;
        }

        let byte = spi.read_received();
        self.feed_byte(byte);
        spi.clear_transfer_complete();
        // clocked out on the *next* transfer
        spi.write_reply(self.reply.load(Ordering::Relaxed));
    }

    /// Advance framing by one received byte
    ///
    /// Bytes that belong to a message are buffered (the SIZE byte in its
    /// normalized form); bytes outside a message are dropped. A ping's
    /// method byte latches the backpressure reply before this returns.
    ///
    /// Room for a whole message is checked when its SIZE byte arrives, so
    /// the channel never holds part of a message the host has finished
    /// sending. A message that does not fit is buffered as an empty header
    /// (SIZE 0), which reads back as [`FrameError::InvalidSize`], and the
    /// rest of it is skipped. A sentinel that finds no room for itself and
    /// a SIZE byte skips its message without buffering anything.
    ///
    /// [`FrameError::InvalidSize`]: spilink_protocol::FrameError::InvalidSize
    pub fn feed_byte(&self, byte: u8) -> Feed {
        critical_section::with(|cs| {
            let cell = self.framer.borrow(cs);
            let mut framer = cell.get();
            let before = framer.state();
            let mut feed = framer.feed(byte);

            if let Some(kept) = feed.byte {
                match before {
                    FramingState::AwaitingSentinel if self.channel.free() < 2 => {
                        framer.discard_frame();
                        feed = Feed::default();
                        self.faults.record_overflow();
                        warn!("receive channel full, skipping message");
                    }
                    FramingState::SawSentinel if usize::from(kept) > self.channel.free() => {
                        framer.discard_frame();
                        feed = Feed {
                            byte: Some(0),
                            ping: false,
                            complete: true,
                        };
                        self.faults.record_overflow();
                        warn!("no room for {=u8} byte message, skipping it", kept);
                    }
                    _ => {}
                }
            }
            cell.set(framer);

            if let Some(kept) = feed.byte {
                if self.channel.push(kept).is_err() {
                    self.faults.record_overflow();
                    warn!("receive channel full, dropped {=u8:#x}", kept);
                }
            }

            if feed.ping {
                let reply = self.ping_reply();
                self.reply.store(reply, Ordering::Relaxed);
                trace!("ping, reply {=u8}", reply);
            }

            if feed.complete {
                let count = self.messages.load(Ordering::Relaxed).saturating_add(1);
                self.messages.store(count, Ordering::Release);
            }

            feed
        })
    }

    /// Backpressure answer to a ping: 1 if the channel has at least
    /// `ping_min_free` free slots, else 0
    pub fn ping_reply(&self) -> u8 {
        u8::from(self.channel.free() >= self.config.ping_min_free)
    }
}
