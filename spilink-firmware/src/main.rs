//! spilink Firmware
//!
//! SPI slave endpoint for STM32F042K6 boards. The host clocks framed
//! messages in on SPI1; this firmware logs them, answers pings with the
//! receive backpressure flag, and reports when the host goes quiet.

#![no_std]
#![no_main]

mod board;

use core::cell::Cell;

use critical_section::Mutex;
use defmt::*;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::InterruptExt;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::board::{ChipSelect, IdleTick, Spi1Slave, StatusLed, UptimeClock};
use spilink_core::{BusEdge, LinkConfig, SpiLink, DEFAULT_CAPACITY};
use spilink_hal::SpiSlaveConfig;

type Link = SpiLink<DEFAULT_CAPACITY>;

/// Idle tick period; the host counts as gone after
/// `idle_timeout_ticks` of these without a selection
const IDLE_TICK_MS: u64 = 4000;

/// Main loop pass when no message arrives
const HEARTBEAT_MS: u64 = 500;

static LINK: StaticCell<Link> = StaticCell::new();

/// Link as seen from the interrupt handlers, set once in `main`
static IRQ_LINK: Mutex<Cell<Option<&'static Link>>> = Mutex::new(Cell::new(None));

/// Raised by the SPI interrupt when a message completes
static MESSAGE_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Raised by the idle task when the host has gone quiet
static HOST_IDLE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

fn registered_link() -> Option<&'static Link> {
    critical_section::with(|cs| IRQ_LINK.borrow(cs).get())
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("spilink firmware starting...");

    let p = embassy_stm32::init(Default::default());

    let config = LinkConfig::DEFAULT;
    let link: &'static Link = LINK.init(unwrap!(Link::try_new(config)));

    // Claim the pins driven through the PAC in `board`
    let _ = (p.SPI1, p.PA4, p.PA5, p.PA6, p.PA7);
    board::setup_pins();
    link.initialize(&mut Spi1Slave, &mut IdleTick, SpiSlaveConfig::default());

    critical_section::with(|cs| IRQ_LINK.borrow(cs).set(Some(link)));
    unsafe {
        interrupt::SPI1.enable();
        interrupt::EXTI4_15.enable();
    }

    let led = StatusLed(Output::new(p.PB3, Level::Low, Speed::Low));

    spawner.spawn(idle_tick_task(link)).unwrap();
    spawner.spawn(app_task(link, led)).unwrap();

    info!("All tasks spawned");
}

#[interrupt]
fn SPI1() {
    if let Some(link) = registered_link() {
        link.on_transfer_complete(&mut Spi1Slave);
        if link.available_message_count() > 0 {
            MESSAGE_READY.signal(());
        }
    }
}

#[interrupt]
fn EXTI4_15() {
    board::clear_chip_select_pending();
    if let Some(link) = registered_link() {
        let edge =
            link.on_chip_select_edge(&ChipSelect, &mut Spi1Slave, &mut IdleTick, &UptimeClock);
        if edge == BusEdge::Deselected && link.available_message_count() > 0 {
            MESSAGE_READY.signal(());
        }
    }
}

/// Idle tick task - feeds the link's idle timer while it is armed
#[embassy_executor::task]
async fn idle_tick_task(link: &'static Link) {
    info!("Idle tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(IDLE_TICK_MS));

    loop {
        ticker.next().await;

        if IdleTick::is_enabled() && link.on_idle_tick(&mut IdleTick) {
            HOST_IDLE.signal(());
        }
    }
}

/// Application task - drains messages and reports link state
#[embassy_executor::task]
async fn app_task(link: &'static Link, mut led: StatusLed) {
    info!("App task started");

    let mut heartbeat = Ticker::every(Duration::from_millis(HEARTBEAT_MS));

    loop {
        match select(MESSAGE_READY.wait(), heartbeat.next()).await {
            Either::First(()) => drain_messages(link),
            Either::Second(()) => {
                link.breathe(&mut led);
                // a wake that raced the signal
                drain_messages(link);
            }
        }

        if HOST_IDLE.try_take().is_some() {
            info!(
                "host idle since {} ms, powering down peripherals",
                link.deselected_at_ms()
            );
        }

        let faults = link.take_faults();
        if !faults.is_clean() {
            warn!("link faults: {}", faults);
        }
    }
}

fn drain_messages(link: &Link) {
    loop {
        match link.next_message() {
            Ok(Some(message)) if message.is_internal() => {
                trace!("internal method {=u8}", message.method);
            }
            Ok(Some(message)) => {
                info!(
                    "message method {=u8}, {} byte payload",
                    message.method,
                    message.payload.len()
                );
            }
            Ok(None) => break,
            Err(e) => warn!("bad frame: {}", e),
        }
    }
}
