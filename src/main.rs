//! LTE bridge firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                    │
//! │  UartTransport   GpioOutput (reset)   SystemClock        │
//! │  LanLeds (IndicatorPort)              LanActuator (sink) │
//! │  ──────────────── Port Trait Boundary ────────────────   │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │  LinkService ─▶ Modem (executor · init · reset)    │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::peripherals::Peripherals;
use log::info;

use ltebridge::adapters::lan_actuator::LanActuator;
use ltebridge::adapters::time::SystemClock;
use ltebridge::adapters::uart::UartTransport;
use ltebridge::app::ports::ClockPort;
use ltebridge::app::service::LinkService;
use ltebridge::config::LinkConfig;
use ltebridge::drivers::gpio::GpioOutput;
use ltebridge::drivers::indicator_led::LanLeds;
use ltebridge::modem::Modem;
use ltebridge::pins;

/// Idle time between service ticks while nothing is in flight.
const LOOP_INTERVAL_MS: u32 = 1;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  LTE bridge v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = LinkConfig::default();
    config.validate()?;
    info!(
        "Config: apn={} broker={}:{} sub={} pub={}",
        config.apn, config.mqtt_broker, config.mqtt_port, config.subscribe_topic, config.publish_topic
    );

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let transport = UartTransport::new(
        peripherals.uart1,
        peripherals.pins.gpio15,
        peripherals.pins.gpio34,
    )?;
    let reset_pin = GpioOutput::new(pins::LTE_RESET_GPIO, true)?;
    let leds = LanLeds::new(
        GpioOutput::new(pins::LAN_LED_RED_GPIO, true)?,
        GpioOutput::new(pins::LAN_LED_GREEN_GPIO, true)?,
    );
    let mut clock = SystemClock::new();

    // ── 4. Link service ───────────────────────────────────────
    let modem = Modem::new(transport, reset_pin, SystemClock::new(), leds, config);
    let mut link = LinkService::new(modem);
    let mut actuator = LanActuator::new();

    info!("System ready. Entering link loop.");

    // ── 5. Link loop ──────────────────────────────────────────
    loop {
        link.tick(&mut actuator);
        clock.sleep_ms(LOOP_INTERVAL_MS);
    }
}
