//! SPI slave abstractions
//!
//! The device never drives the clock. Every byte the host clocks in is
//! paired with the byte that was sitting in the output register, so the
//! reply for transfer `n` has to be staged during transfer `n - 1`.

/// Byte-oriented SPI slave peripheral
///
/// All methods are called from interrupt context and must complete in a
/// handful of cycles.
pub trait SpiSlave {
    /// Apply mode and clocking settings
    ///
    /// Called once during initialization.
    fn configure(&mut self, config: SpiSlaveConfig);

    /// Read the byte received by the transfer that just completed
    fn read_received(&mut self) -> u8;

    /// Stage the byte shifted out to the host on the next transfer
    fn write_reply(&mut self, byte: u8);

    /// Acknowledge the transfer-complete condition
    ///
    /// Peripherals that clear the flag on data register read can leave
    /// this empty.
    fn clear_transfer_complete(&mut self);

    /// Enable or disable the byte-received interrupt
    fn set_byte_event_enabled(&mut self, enabled: bool);
}

/// SPI slave configuration
///
/// The shift clock always comes from the host; the mode fixes which of
/// its edges samples data (see [`Mode::samples_on_rising_edge`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiSlaveConfig {
    /// Clock polarity and phase
    pub mode: Mode,
}

impl Default for SpiSlaveConfig {
    fn default() -> Self {
        Self { mode: Mode::Mode0 }
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    /// Whether data is sampled on the rising clock edge
    pub fn samples_on_rising_edge(self) -> bool {
        matches!(self, Mode::Mode0 | Mode::Mode3)
    }
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_split() {
        let (pol, pha): (Polarity, Phase) = Mode::Mode3.into();
        assert_eq!(pol, Polarity::IdleHigh);
        assert_eq!(pha, Phase::CaptureOnSecondTransition);

        let (pol, pha): (Polarity, Phase) = Mode::Mode0.into();
        assert_eq!(pol, Polarity::IdleLow);
        assert_eq!(pha, Phase::CaptureOnFirstTransition);
    }

    #[test]
    fn test_default_config_is_mode0() {
        let config = SpiSlaveConfig::default();
        assert_eq!(config.mode, Mode::Mode0);
        assert!(config.mode.samples_on_rising_edge());
    }

    #[test]
    fn test_sampling_edge_per_mode() {
        for (mode, rising) in [
            (Mode::Mode0, true),
            (Mode::Mode1, false),
            (Mode::Mode2, false),
            (Mode::Mode3, true),
        ] {
            assert_eq!(mode.samples_on_rising_edge(), rising, "{:?}", mode);
        }
    }
}
