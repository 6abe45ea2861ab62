//! Humidor Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single fixed-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (Sensor+Actuator) (EventSink)    (Storage)    (Clock)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Safety · Hysteresis · Window · Stats · Learning       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use log::info;

use humidor::adapters::hardware::HardwareAdapter;
use humidor::adapters::log_sink::LogEventSink;
use humidor::adapters::nvs::NvsAdapter;
use humidor::adapters::time::Esp32TimeAdapter;
use humidor::app::ports::ClockPort;
use humidor::app::service::AppService;
use humidor::drivers::humidifier::HumidifierDriver;
use humidor::drivers::hw_init;
use humidor::drivers::indicator::IndicatorLed;
use humidor::drivers::watchdog::Watchdog;
use humidor::error::Error;
use humidor::pins;

/// Control loop period.  Every component rate-limits itself against the
/// clock, so this only bounds jitter (and the indicator blink rate).
const CONTROL_TICK_MS: u32 = 250;

fn build_service(clock: &Esp32TimeAdapter) -> humidor::error::Result<AppService<NvsAdapter>> {
    let nvs = NvsAdapter::new()?;
    Ok(AppService::new(nvs, clock.now_ms())?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Humidor v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals().context("peripheral init")?;

    // SAFETY: pin numbers come from the board map and each is claimed once.
    let humidifier_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::HUMIDIFIER_GPIO) })
        .map_err(|_| Error::Init("humidifier pin"))?;
    let indicator_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::INDICATOR_GPIO) })
        .map_err(|_| Error::Init("indicator pin"))?;

    let mut hw = HardwareAdapter::new(
        HumidifierDriver::new(humidifier_pin),
        IndicatorLed::new(indicator_pin, pins::INDICATOR_ACTIVE_LOW),
    );
    let mut watchdog = Watchdog::default();

    // ── 3. Settings + app service ─────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut app = build_service(&clock).context("settings store")?;
    app.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop ({}ms tick).", CONTROL_TICK_MS);

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        app.tick(&mut hw, &clock, &mut sink);
        watchdog.feed();
        FreeRtos::delay_ms(CONTROL_TICK_MS);
    }
}
