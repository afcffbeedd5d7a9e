//! STM32F042 board bindings
//!
//! SPI1 runs as a hardware slave on PA5 (SCK), PA6 (MISO) and PA7 (MOSI).
//! Chip select is PA4, watched through EXTI line 4 on both edges. The
//! embassy SPI driver is master-only, so the slave side is driven through
//! the PAC.

use core::ptr;

use embassy_stm32::gpio::Output;
use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::{Idr, Moder, Pupdr};
use embassy_stm32::pac::spi::vals::{Cpha, Cpol, Ds, Frxth, Mstr};
use embassy_time::Instant;
use portable_atomic::{AtomicBool, Ordering};
use spilink_hal::{InputPin, MillisClock, OutputPin, Phase, Polarity, SpiSlave, SpiSlaveConfig, TickSource};

const CS_PIN: usize = 4;
const SPI_PINS: [usize; 3] = [5, 6, 7];
/// SPI1 on PA5..PA7 is alternate function 0
const SPI_AF: u8 = 0;
const PORT_A: u8 = 0;

/// Route SPI1 and the chip-select line to their pins
pub fn setup_pins() {
    let gpio = pac::GPIOA;
    for pin in SPI_PINS {
        gpio.afr(pin / 8).modify(|w| w.set_afr(pin % 8, SPI_AF));
        gpio.moder().modify(|w| w.set_moder(pin, Moder::ALTERNATE));
    }

    gpio.moder().modify(|w| w.set_moder(CS_PIN, Moder::INPUT));
    gpio.pupdr().modify(|w| w.set_pupdr(CS_PIN, Pupdr::PULL_UP));

    pac::RCC.apb2enr().modify(|w| {
        w.set_spi1en(true);
        w.set_syscfgen(true);
    });

    pac::SYSCFG
        .exticr(CS_PIN / 4)
        .modify(|w| w.set_exti(CS_PIN % 4, PORT_A));
    pac::EXTI.rtsr(0).modify(|w| w.set_line(CS_PIN, true));
    pac::EXTI.ftsr(0).modify(|w| w.set_line(CS_PIN, true));
    clear_chip_select_pending();
    pac::EXTI.imr(0).modify(|w| w.set_line(CS_PIN, true));
}

/// Acknowledge the chip-select EXTI line
pub fn clear_chip_select_pending() {
    pac::EXTI.pr(0).write(|w| w.set_line(CS_PIN, true));
}

/// PA4 chip-select level
pub struct ChipSelect;

impl InputPin for ChipSelect {
    fn is_high(&self) -> bool {
        pac::GPIOA.idr().read().idr(CS_PIN) == Idr::HIGH
    }
}

/// SPI1 in slave mode
pub struct Spi1Slave;

impl SpiSlave for Spi1Slave {
    fn configure(&mut self, config: SpiSlaveConfig) {
        let spi = pac::SPI1;
        let (polarity, phase) = config.mode.into();

        spi.cr1().modify(|w| w.set_spe(false));
        spi.cr1().modify(|w| {
            w.set_mstr(Mstr::SLAVE);
            w.set_cpol(match polarity {
                Polarity::IdleLow => Cpol::IDLE_LOW,
                Polarity::IdleHigh => Cpol::IDLE_HIGH,
            });
            w.set_cpha(match phase {
                Phase::CaptureOnFirstTransition => Cpha::FIRST_EDGE,
                Phase::CaptureOnSecondTransition => Cpha::SECOND_EDGE,
            });
            // hardware NSS on PA4 is not used; selection is tracked by EXTI
            w.set_ssm(true);
            w.set_ssi(false);
        });
        spi.cr2().modify(|w| {
            w.set_ds(Ds::BITS8);
            w.set_frxth(Frxth::QUARTER);
        });
        spi.cr1().modify(|w| w.set_spe(true));
        defmt::debug!(
            "SPI1 slave, sampling on {} edge",
            if config.mode.samples_on_rising_edge() { "rising" } else { "falling" }
        );
    }

    fn read_received(&mut self) -> u8 {
        // 8-bit access, a 16-bit read would pop two bytes from the FIFO
        unsafe { ptr::read_volatile(pac::SPI1.dr().as_ptr() as *const u8) }
    }

    fn write_reply(&mut self, byte: u8) {
        unsafe { ptr::write_volatile(pac::SPI1.dr().as_ptr() as *mut u8, byte) }
    }

    fn clear_transfer_complete(&mut self) {
        // RXNE clears on the data register read
    }

    fn set_byte_event_enabled(&mut self, enabled: bool) {
        pac::SPI1.cr2().modify(|w| w.set_rxneie(enabled));
    }
}

static IDLE_TICK_ENABLED: AtomicBool = AtomicBool::new(false);

/// Idle tick gate
///
/// Ticks come from an executor task; the task only forwards them while
/// the link has the source enabled.
pub struct IdleTick;

impl IdleTick {
    pub fn is_enabled() -> bool {
        IDLE_TICK_ENABLED.load(Ordering::Acquire)
    }
}

impl TickSource for IdleTick {
    fn set_tick_enabled(&mut self, enabled: bool) {
        IDLE_TICK_ENABLED.store(enabled, Ordering::Release);
    }
}

/// Milliseconds since boot from the embassy time driver
pub struct UptimeClock;

impl MillisClock for UptimeClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Status LED on PB3
pub struct StatusLed(pub Output<'static>);

impl OutputPin for StatusLed {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}
