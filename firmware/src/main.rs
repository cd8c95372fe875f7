//! PulseBreath firmware entry point.
//!
//! Hexagonal architecture with a cooperative multi-rate control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            LogEventSink      Esp32TimeAdapter │
//! │  (SampleSource · GasAdc ·   (EventSink)       (Clock)          │
//! │   EnvSource · HeaterPort)                                      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  Scheduler · PPG · Motion · Gas FSM · Trend            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SHARED_STATE (critical-section snapshot for other contexts)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info};

use pulsebreath::adapters::hardware::HardwareAdapter;
use pulsebreath::adapters::log_sink::LogEventSink;
use pulsebreath::adapters::time::Esp32TimeAdapter;
use pulsebreath::app::service::MonitorService;
use pulsebreath::config::SystemConfig;
use pulsebreath::drivers::heater::Heater;
use pulsebreath::drivers::hw_init;
use pulsebreath::error::Error;
use pulsebreath::pins;
use pulsebreath::sensors::env::EnvSensor;
use pulsebreath::sensors::gas_adc::GasAdcChannel;
use pulsebreath::sensors::ppg::PpgFrontEnd;
use pulsebreath::state::SharedState;

/// Latest published snapshot, readable from any context (BLE, display).
static SHARED_STATE: SharedState = SharedState::new();

/// Idle time between loop passes.  Shorter than every task period.
const LOOP_DELAY_MS: u32 = 1;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PulseBreath v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    // Without the ADC there is no gas channel; bail out and let the
    // runtime restart the board.
    hw_init::init_peripherals().map_err(|e| {
        error!("HAL init failed: {}", e);
        Error::from(e)
    })?;

    let peripherals = Peripherals::take()?;
    let heater_pin = PinDriver::output(peripherals.pins.gpio9)?;
    let heater = Heater::new(heater_pin).map_err(Error::from)?;
    info!("Heater on GPIO{}, gas ADC on GPIO{}", pins::GAS_HEATER_GPIO, pins::GAS_ADC_GPIO);

    let mut hw = HardwareAdapter::new(
        PpgFrontEnd::new(),
        GasAdcChannel::new(pins::GAS_ADC_CHANNEL),
        EnvSensor::new(),
        heater,
    );

    // ── 3. Application core ───────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut app = MonitorService::new(SystemConfig::default())?;
    app.start(&clock, &mut sink);
    SHARED_STATE.store(*app.published());

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        if app.poll(&clock, &mut hw, &mut sink) {
            SHARED_STATE.store(*app.published());
        }
        FreeRtos::delay_ms(LOOP_DELAY_MS);
    }
}
