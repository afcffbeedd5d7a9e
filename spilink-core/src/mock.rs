//! Mock peripherals for host tests

use spilink_hal::{InputPin, MillisClock, OutputPin, SpiSlave, SpiSlaveConfig, TickSource};

/// SPI slave that records what the link did to it
pub struct MockSpi {
    pub config: Option<SpiSlaveConfig>,
    pub event_enabled: bool,
    /// Byte the host clocked in on the last transfer
    pub received: u8,
    /// Byte staged for the next transfer
    pub staged: u8,
    pub completions_cleared: usize,
}

impl MockSpi {
    pub fn new() -> Self {
        Self {
            config: None,
            event_enabled: false,
            received: 0,
            staged: 0,
            completions_cleared: 0,
        }
    }
}

impl SpiSlave for MockSpi {
    fn configure(&mut self, config: SpiSlaveConfig) {
        self.config = Some(config);
    }

    fn read_received(&mut self) -> u8 {
        self.received
    }

    fn write_reply(&mut self, byte: u8) {
        self.staged = byte;
    }

    fn clear_transfer_complete(&mut self) {
        self.completions_cleared += 1;
    }

    fn set_byte_event_enabled(&mut self, enabled: bool) {
        self.event_enabled = enabled;
    }
}

/// Chip-select line
pub struct MockPin {
    high: bool,
}

impl MockPin {
    pub fn new(high: bool) -> Self {
        Self { high }
    }

    pub fn set(&mut self, high: bool) {
        self.high = high;
    }
}

impl InputPin for MockPin {
    fn is_high(&self) -> bool {
        self.high
    }
}

/// Status LED
#[derive(Default)]
pub struct MockLed {
    pub high: bool,
}

impl OutputPin for MockLed {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[derive(Default)]
pub struct MockTick {
    pub enabled: bool,
}

impl TickSource for MockTick {
    fn set_tick_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

pub struct MockClock {
    now: u32,
}

impl MockClock {
    pub fn new(now: u32) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: u32) {
        self.now = now;
    }
}

impl MillisClock for MockClock {
    fn now_ms(&self) -> u32 {
        self.now
    }
}

/// A link wired to mock peripherals, driven the way a host would
pub struct LinkBench<const N: usize> {
    pub link: crate::SpiLink<N>,
    pub spi: MockSpi,
    pub pin: MockPin,
    pub tick: MockTick,
    pub clock: MockClock,
}

impl<const N: usize> LinkBench<N> {
    pub fn new(config: crate::LinkConfig) -> Self {
        let mut bench = Self {
            link: crate::SpiLink::new(config),
            spi: MockSpi::new(),
            pin: MockPin::new(true),
            tick: MockTick::default(),
            clock: MockClock::new(0),
        };
        bench
            .link
            .initialize(&mut bench.spi, &mut bench.tick, SpiSlaveConfig::default());
        bench
    }

    pub fn select(&mut self) {
        self.pin.set(false);
        self.edge();
    }

    pub fn deselect(&mut self) {
        self.pin.set(true);
        self.edge();
    }

    fn edge(&mut self) {
        self.link
            .on_chip_select_edge(&self.pin, &mut self.spi, &mut self.tick, &self.clock);
    }

    /// One SPI transfer: returns the byte the host clocked out of the device
    pub fn transfer(&mut self, byte: u8) -> u8 {
        let out = self.spi.staged;
        self.spi.received = byte;
        if self.spi.event_enabled {
            self.link.on_transfer_complete(&mut self.spi);
        }
        out
    }

    pub fn send(&mut self, bytes: &[u8]) -> std::vec::Vec<u8> {
        bytes.iter().map(|&b| self.transfer(b)).collect()
    }

    /// One idle tick, delivered only while the tick source is enabled
    pub fn tick(&mut self) -> bool {
        if self.tick.enabled {
            self.link.on_idle_tick(&mut self.tick)
        } else {
            false
        }
    }
}
