//! Configuration type definitions

use spilink_protocol::PING_BYTES_TO_HAVE_FREE;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default receive channel capacity in bytes
pub const DEFAULT_CAPACITY: usize = 100;

/// Idle ticks while deselected before the link reports a timeout
pub const DEFAULT_IDLE_TIMEOUT_TICKS: u8 = 3;

/// Chip-select polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChipSelectPolarity {
    /// Selected while the line is low
    #[default]
    ActiveLow,
    /// Selected while the line is high
    ActiveHigh,
}

impl ChipSelectPolarity {
    /// Whether a line level means "selected"
    pub const fn is_asserted(self, line_high: bool) -> bool {
        match self {
            ChipSelectPolarity::ActiveLow => !line_high,
            ChipSelectPolarity::ActiveHigh => line_high,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Ping headroom larger than the channel
    PingHeadroomExceedsCapacity,
    /// Idle timeout of zero ticks
    ZeroIdleTimeout,
}

/// Link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Free channel slots needed for a ping to report healthy
    pub ping_min_free: usize,
    /// Idle ticks before timing out
    pub idle_timeout_ticks: u8,
    /// Chip-select polarity
    pub chip_select: ChipSelectPolarity,
    /// Reply byte staged before the application sets one
    pub initial_reply: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl LinkConfig {
    /// Defaults for a [`DEFAULT_CAPACITY`] channel
    pub const DEFAULT: Self = Self::for_capacity(DEFAULT_CAPACITY);

    /// Defaults for a channel of `capacity` bytes
    pub const fn for_capacity(capacity: usize) -> Self {
        Self {
            ping_min_free: capacity.saturating_sub(PING_BYTES_TO_HAVE_FREE),
            idle_timeout_ticks: DEFAULT_IDLE_TIMEOUT_TICKS,
            chip_select: ChipSelectPolarity::ActiveLow,
            initial_reply: 0,
        }
    }

    pub const fn with_ping_min_free(mut self, slots: usize) -> Self {
        self.ping_min_free = slots;
        self
    }

    pub const fn with_idle_timeout_ticks(mut self, ticks: u8) -> Self {
        self.idle_timeout_ticks = ticks;
        self
    }

    pub const fn with_chip_select(mut self, polarity: ChipSelectPolarity) -> Self {
        self.chip_select = polarity;
        self
    }

    pub const fn with_initial_reply(mut self, reply: u8) -> Self {
        self.initial_reply = reply;
        self
    }

    /// Check the configuration against a channel capacity
    pub fn validate(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.ping_min_free > capacity {
            return Err(ConfigError::PingHeadroomExceedsCapacity);
        }
        if self.idle_timeout_ticks == 0 {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        Ok(())
    }
}
