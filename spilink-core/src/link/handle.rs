//! Link handle and main-loop API

use core::cell::Cell;

use critical_section::Mutex;
use portable_atomic::{AtomicU8, Ordering};
use spilink_hal::{InputPin, MillisClock, OutputPin, SpiSlave, SpiSlaveConfig, TickSource};
use spilink_protocol::{has_complete_message, read_message, FrameError, Framer, Message};

use crate::bus::{BusEdge, BusMonitor, IdleTimer};
use crate::channel::{ByteChannel, ChannelReader};
use crate::config::{ConfigError, LinkConfig, DEFAULT_CAPACITY};
use crate::fault::{FaultCounters, LinkFaults};

/// SPI slave link shared by the interrupt handlers and the main loop
///
/// `N` is the receive channel capacity in bytes.
pub struct SpiLink<const N: usize = DEFAULT_CAPACITY> {
    pub(super) config: LinkConfig,
    pub(super) channel: ByteChannel<N>,
    pub(super) bus: BusMonitor,
    pub(super) idle: IdleTimer,
    pub(super) framer: Mutex<Cell<Framer>>,
    /// Byte clocked out on the next transfer
    pub(super) reply: AtomicU8,
    /// Complete messages buffered and not yet claimed
    pub(super) messages: AtomicU8,
    pub(super) faults: FaultCounters,
}

impl<const N: usize> SpiLink<N> {
    /// Create a link without checking `config`
    pub const fn new(config: LinkConfig) -> Self {
        Self {
            config,
            channel: ByteChannel::new(),
            bus: BusMonitor::new(config.chip_select),
            idle: IdleTimer::new(config.idle_timeout_ticks),
            framer: Mutex::new(Cell::new(Framer::new())),
            reply: AtomicU8::new(config.initial_reply),
            messages: AtomicU8::new(0),
            faults: FaultCounters::new(),
        }
    }

    /// Create a link after validating `config` against the capacity
    pub fn try_new(config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate(N)?;
        Ok(Self::new(config))
    }

    /// Bring the peripherals into their idle state
    ///
    /// The byte interrupt stays off until the host selects the device and
    /// the idle tick stays off until it first deselects it.
    pub fn initialize<S, T>(&self, spi: &mut S, tick: &mut T, spi_config: SpiSlaveConfig)
    where
        S: SpiSlave,
        T: TickSource,
    {
        spi.configure(spi_config);
        spi.set_byte_event_enabled(false);
        spi.write_reply(self.reply());
        tick.set_tick_enabled(false);
        info!("spilink ready, {} byte channel", N);
    }

    /// Chip-select edge interrupt handler
    pub fn on_chip_select_edge<P, S, T, C>(
        &self,
        chip_select: &P,
        spi: &mut S,
        tick: &mut T,
        clock: &C,
    ) -> BusEdge
    where
        P: InputPin,
        S: SpiSlave,
        T: TickSource,
        C: MillisClock,
    {
        let outcome = critical_section::with(|_| {
            self.bus
                .on_edge(chip_select, spi, &self.idle, tick, clock)
        });

        if outcome.desync {
            self.faults.record_select_desync();
            warn!("chip-select edge out of step with pin level");
        }
        match outcome.edge {
            BusEdge::Selected => trace!("selected"),
            BusEdge::Deselected => trace!("deselected"),
        }
        outcome.edge
    }

    /// Idle tick handler
    ///
    /// Safe to call from the tick interrupt or from a main-loop task.
    /// Returns `true` on the tick that raised the timed-out flag.
    pub fn on_idle_tick<T: TickSource>(&self, tick: &mut T) -> bool {
        let fired = critical_section::with(|_| self.idle.on_tick(&self.bus, tick));
        if fired {
            debug!("host silent for {} ticks", self.idle.threshold());
        }
        fired
    }

    /// Set the byte clocked out to the host
    ///
    /// The host sees it on the transfer after the next one completes.
    pub fn set_reply(&self, byte: u8) {
        self.reply.store(byte, Ordering::Relaxed);
    }

    /// Currently latched reply byte
    pub fn reply(&self) -> u8 {
        self.reply.load(Ordering::Relaxed)
    }

    /// True while the host has the device deselected
    pub fn should_sleep(&self) -> bool {
        !self.bus.is_selected()
    }

    /// True while the host has the device selected
    pub fn is_selected(&self) -> bool {
        self.bus.is_selected()
    }

    /// True once the host has been silent for the idle threshold
    pub fn timed_out(&self) -> bool {
        self.idle.timed_out()
    }

    /// When the host last deselected the device
    pub fn deselected_at_ms(&self) -> Option<u32> {
        self.bus.deselected_at_ms()
    }

    /// Number of complete messages buffered and not yet claimed
    pub fn available_message_count(&self) -> u8 {
        self.messages.load(Ordering::Acquire)
    }

    /// Claim one buffered message
    ///
    /// Returns `false` if none is available. The caller is expected to
    /// drain the message's bytes from [`buffer`](Self::buffer).
    pub fn take_message(&self) -> bool {
        critical_section::with(|_| {
            let count = self.messages.load(Ordering::Acquire);
            if count == 0 {
                return false;
            }
            self.messages.store(count - 1, Ordering::Release);
            true
        })
    }

    /// Check the buffered bytes for a complete message without consuming it
    ///
    /// Bytes in front of the first sentinel are discarded.
    pub fn has_complete_message(&self) -> bool {
        has_complete_message(&mut self.buffer())
    }

    /// Claim and read the next complete message
    ///
    /// A frame too short to hold a method byte is dropped, counted as
    /// malformed, and reported as an error; the next call moves on to the
    /// following message.
    pub fn next_message(&self) -> Result<Option<Message>, FrameError> {
        if self.available_message_count() == 0 {
            return Ok(None);
        }

        let result = read_message(&mut self.buffer());
        match &result {
            Ok(None) => return Ok(None),
            Ok(Some(message)) => trace!("message method {=u8}", message.method),
            Err(e) => {
                self.faults.record_malformed();
                warn!("dropped malformed frame: {}", e);
            }
        }
        self.take_message();
        result
    }

    /// Main-loop view of the receive channel
    pub fn buffer(&self) -> ChannelReader<'_, N> {
        self.channel.reader()
    }

    /// Receive channel capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Link configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Snapshot of the framing state machine
    pub fn framer(&self) -> Framer {
        critical_section::with(|cs| self.framer.borrow(cs).get())
    }

    /// Fault counters so far
    pub fn faults(&self) -> LinkFaults {
        self.faults.snapshot()
    }

    /// Fault counters so far, resetting them
    pub fn take_faults(&self) -> LinkFaults {
        self.faults.take()
    }

    /// Toggle a status LED, once per main-loop pass
    pub fn breathe<L: OutputPin>(&self, led: &mut L) {
        led.toggle();
    }
}
