//! PairLink node firmware — Main Entry Point
//!
//! One board image for both ends of the pair; the role strap picks the
//! behaviour at boot.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  Nrf24          GpioPin          LogEventSink   Esp32Time    │
//! │  (RadioLink)    (Input/Output)   (EventSink)    (Clock)      │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │       InitiatorNode  |  ResponderNode  (SyncCycle)     │  │
//! │  │   delivery · link health · relay state machine         │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  Watchdog (fed every tick)                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::spi::config::{Config as SpiConfig, DriverConfig};
use esp_idf_svc::hal::spi::{SpiDeviceDriver, SpiDriver};
use esp_idf_svc::hal::units::FromValueType;
use log::{error, info};

use pairlink::adapters::log_sink::LogEventSink;
use pairlink::adapters::time::Esp32TimeAdapter;
use pairlink::config::LinkConfig;
use pairlink::drivers::gpio::GpioPin;
use pairlink::drivers::hw_init;
use pairlink::drivers::nrf24::Nrf24;
use pairlink::drivers::watchdog::Watchdog;
use pairlink::error::Error;
use pairlink::node::{InitiatorNode, ResponderNode, SyncCycle};
use pairlink::pins;
use pairlink::role::{Role, select_role};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PairLink v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = LinkConfig::default();
    config.validate().map_err(Error::from)?;
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => error!("Config not serialisable: {}", e),
    }

    // ── 3. Role ───────────────────────────────────────────────
    let mut time = Esp32TimeAdapter::new();
    hw_init::init_role_pin().map_err(Error::from)?;
    let Ok(role) = select_role(
        &mut GpioPin::new(pins::ROLE_GPIO),
        &mut time,
        config.role_settle_ms,
    );
    hw_init::init_functional_pin(role, config.safe_state).map_err(Error::from)?;

    // ── 4. Radio ──────────────────────────────────────────────
    hw_init::init_radio_ce_pin().map_err(Error::from)?;
    let peripherals = Peripherals::take()?;
    let bus = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio12,
        peripherals.pins.gpio11,
        Some(peripherals.pins.gpio13),
        &DriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        bus,
        Some(peripherals.pins.gpio10),
        &SpiConfig::new().baudrate(pins::RADIO_SPI_HZ.Hz()),
    )?;
    info!(
        "Radio SPI: sclk=GPIO{} mosi=GPIO{} miso=GPIO{} csn=GPIO{} ce=GPIO{}",
        pins::RADIO_SCLK_GPIO,
        pins::RADIO_MOSI_GPIO,
        pins::RADIO_MISO_GPIO,
        pins::RADIO_CSN_GPIO,
        pins::RADIO_CE_GPIO
    );

    let mut radio = Nrf24::new(spi, GpioPin::new(pins::RADIO_CE_GPIO), Ets);
    if let Err(e) = radio.init(config.rf_channel) {
        // The functional pin already holds the safe state; stay there.
        error!("Radio init failed: {:?} — halting", e);
        anyhow::bail!(Error::Radio("transceiver not responding"));
    }

    // ── 5. Run the selected role forever ──────────────────────
    let watchdog = Watchdog::new(&config);
    let functional = GpioPin::new(pins::FUNCTIONAL_GPIO);
    match role {
        Role::Initiator => run(InitiatorNode::new(radio, functional, &config), &config, &watchdog, time),
        Role::Responder => run(ResponderNode::new(radio, functional, &config), &config, &watchdog, time),
    }
}

fn run<N: SyncCycle>(
    mut node: N,
    config: &LinkConfig,
    watchdog: &Watchdog,
    mut time: Esp32TimeAdapter,
) -> Result<()> {
    use embedded_hal::delay::DelayNs;

    let mut sink = LogEventSink::new();
    node.start(&mut time, &mut sink)?;
    info!("{} loop running every {} ms", node.role(), config.tick_interval_ms);

    loop {
        node.tick(&mut time, &mut sink);
        watchdog.feed();
        time.delay_ms(config.tick_interval_ms);
    }
}
