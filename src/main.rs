//! PowerWheel Firmware: Main Entry Point
//!
//! Four periodic activities share one `Arc<ControlState>`.  Remote
//! commands are queued by the HTTP server and dispatched by one of them.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  DriveHardware        StatusLed       NvsAdapter   Esp32Time   │
//! │  (Throttle+Motor)     (Indicator)     (Storage)    (Clock)     │
//! │  WsTransport + HTTP server            SoftAp                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────────────┐    │
//! │  │ DriveLoop    │ │ IndicatorLoop│ │ TelemetryBroadcaster │    │
//! │  │ P=20, core 1 │ │ P=10         │ │ P=5                  │    │
//! │  └──────┬───────┘ └──────┬───────┘ └──────────┬───────────┘    │
//! │         └──────── Arc<ControlState> ──────────┘                │
//! │                          ▲                                     │
//! │  httpd ──▶ Inbox ──▶ CommandChannel ──▶ CommandService (P=12)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use log::{error, info, warn};

use powerwheel::adapters::hardware::DriveHardware;
use powerwheel::adapters::nvs::NvsAdapter;
use powerwheel::adapters::time::Esp32TimeAdapter;
use powerwheel::adapters::wifi::{SoftAp, SoftApConfig};
use powerwheel::adapters::ws_server::{self, WsTransport};
use powerwheel::app::ports::ClockPort;
use powerwheel::app::service::CommandService;
use powerwheel::app::state::ControlState;
use powerwheel::config::{DriveConfig, MAX_LISTENERS};
use powerwheel::control::drive::DriveLoop;
use powerwheel::control::indicator::{IDLE_PERIOD_MS, IndicatorLoop};
use powerwheel::control::telemetry::TelemetryBroadcaster;
use powerwheel::drivers::motor::MotorDriver;
use powerwheel::drivers::pedal::PedalInput;
use powerwheel::drivers::status_led::StatusLed;
use powerwheel::drivers::watchdog::{DRIVE_WATCHDOG_TIMEOUT_MS, Watchdog};
use powerwheel::error::Error;
use powerwheel::pins;
use powerwheel::rpc::channel::CommandChannel;
use powerwheel::rpc::inbox::Inbox;
use powerwheel::scheduler::{Periodic, spawn_periodic};

const AP_SSID: &str = "PowerWheel";
const AP_CHANNEL: u8 = 1;

fn ledc_resolution(bits: u8) -> Result<Resolution> {
    Ok(match bits {
        8 => Resolution::Bits8,
        10 => Resolution::Bits10,
        12 => Resolution::Bits12,
        13 => Resolution::Bits13,
        14 => Resolution::Bits14,
        other => anyhow::bail!("unsupported motor PWM resolution: {} bits", other),
    })
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PowerWheel v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = DriveConfig::default();
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Persisted limits ───────────────────────────────────
    let nvs = NvsAdapter::new(&config.nvs_namespace).context("NVS init")?;
    let state = Arc::new(ControlState::load(&nvs, &config));

    // ── 3. Drive hardware ─────────────────────────────────────
    let mut pedal_fwd = PinDriver::input(peripherals.pins.gpio32)?;
    pedal_fwd.set_pull(Pull::Up)?;
    let mut pedal_bwd = PinDriver::input(peripherals.pins.gpio33)?;
    pedal_bwd.set_pull(Pull::Up)?;
    info!(
        "Pedals on GPIO{} (forward) / GPIO{} (backward), active-low",
        pins::PEDAL_FORWARD_GPIO,
        pins::PEDAL_BACKWARD_GPIO
    );

    let timer = Arc::new(LedcTimerDriver::new(
        peripherals.ledc.timer1,
        &TimerConfig::new()
            .frequency(config.motor_pwm_freq_hz.Hz().into())
            .resolution(ledc_resolution(config.motor_pwm_resolution_bits)?),
    )?);
    let pwm_fwd = LedcDriver::new(peripherals.ledc.channel1, timer.clone(), peripherals.pins.gpio18)?;
    let pwm_bwd = LedcDriver::new(peripherals.ledc.channel2, timer.clone(), peripherals.pins.gpio19)?;
    info!(
        "Motor PWM on GPIO{}/GPIO{} (LEDC ch{}/ch{}, timer {}, {} Hz, {} bits)",
        pins::MOTOR_FORWARD_PWM_GPIO,
        pins::MOTOR_BACKWARD_PWM_GPIO,
        pins::LEDC_CH_MOTOR_FORWARD,
        pins::LEDC_CH_MOTOR_BACKWARD,
        pins::LEDC_TIMER_MOTOR,
        config.motor_pwm_freq_hz,
        config.motor_pwm_resolution_bits
    );

    let hardware = DriveHardware::new(
        PedalInput::new(pedal_fwd, "forward"),
        PedalInput::new(pedal_bwd, "backward"),
        MotorDriver::new(pwm_fwd, pwm_bwd),
    );
    let led = StatusLed::new(PinDriver::output(peripherals.pins.gpio2)?);

    // ── 4. Network + Command Channel ──────────────────────────
    let _ap = SoftAp::start(
        peripherals.modem,
        sysloop,
        SoftApConfig::new(AP_SSID, AP_CHANNEL, MAX_LISTENERS as u16)?,
    )?;

    let channel = Arc::new(CommandChannel::new(WsTransport::new()));
    channel.register_consumer(Arc::new(CommandService::new(Arc::clone(&state), nvs)))?;
    let inbox = Arc::new(Inbox::new());
    let _server = ws_server::start(Arc::clone(&channel), Arc::clone(&inbox), &config.ws_path)?;

    // ── 5. Periodic activities ────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut drive = DriveLoop::new(hardware, Arc::clone(&state), &config, clock.now_ms());
    let mut watchdog: Option<Watchdog> = None;
    let drive_task = spawn_periodic(Periodic::DRIVE, move || {
        let wd = watchdog.get_or_insert_with(|| {
            Watchdog::subscribe_current_task(DRIVE_WATCHDOG_TIMEOUT_MS)
        });
        wd.feed();
        match drive.tick(clock.now_ms()) {
            Ok(delay) => ControlFlow::Continue(delay),
            Err(e) => {
                error!("drive: fatal {}", Error::from(e));
                ControlFlow::Break(())
            }
        }
    })?;

    // Replies go through detached senders, so commands are dispatched here
    // rather than on the httpd task.
    let dispatch_channel = Arc::clone(&channel);
    let command_poll = Duration::from_millis(u64::from(config.command_poll_ms));
    spawn_periodic(Periodic::COMMANDS, move || {
        inbox.drain(dispatch_channel.as_ref());
        ControlFlow::Continue(command_poll)
    })?;

    let mut indicator = IndicatorLoop::new(led, Arc::clone(&state));
    spawn_periodic(Periodic::INDICATOR, move || match indicator.half_cycle() {
        Ok(delay) => ControlFlow::Continue(delay),
        Err(e) => {
            warn!("indicator: {}", Error::from(e));
            ControlFlow::Continue(Duration::from_millis(u64::from(IDLE_PERIOD_MS)))
        }
    })?;

    let mut telemetry = TelemetryBroadcaster::new(Arc::clone(&state));
    let telemetry_period = Duration::from_millis(u64::from(config.telemetry_interval_ms));
    spawn_periodic(Periodic::TELEMETRY, move || {
        telemetry.step(channel.as_ref());
        ControlFlow::Continue(telemetry_period)
    })?;

    info!("PowerWheel ready");

    // ── 6. Supervise ──────────────────────────────────────────
    // The drive task only returns after a motor fault; outputs are already
    // off and the emergency stop latched.
    let _ = drive_task.join();
    error!("drive task ended, restarting");
    esp_idf_hal::reset::restart()
}
