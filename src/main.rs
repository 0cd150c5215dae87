//! EVSE Gateway LED Firmware — Main Entry Point
//!
//! Hexagonal architecture with event-driven execution: the LED manager is
//! a cooperative task that runs only when woken, and computes its own next
//! wake after every pass.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EvseLink / NetworkStatus   LogEventSink   NvsAdapter          │
//! │  (EvseStatusPort)           (EventSink)    (ConfigPort)        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              LedManager (pure logic)                   │    │
//! │  │  Arbiter · OverrideStore · Palette                     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  RenderBackend (one of: PWM RGB · pixel strip · fx strip)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::Result;
use log::{info, warn};

use evsegw::adapters::gateway_link::{EVSE_LINK, NET_STATUS};
use evsegw::adapters::log_sink::LogEventSink;
use evsegw::adapters::nvs::NvsAdapter;
use evsegw::adapters::time::Esp32TimeAdapter;
use evsegw::app::commands::pop_command;
use evsegw::app::ports::ConfigPort;
use evsegw::config::LedConfig;
use evsegw::drivers;
use evsegw::events::{self, Event};
use evsegw::led::manager::{LedManager, WakeDelay};

/// Granularity of the cooperative sleep — the loop re-checks the event
/// queue at this rate while waiting for a timed wake.
const WAKE_SLICE: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EVSE Gateway LED v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Hardware peripherals ───────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // A dark status LED is not worth halting the gateway over —
        // duty writes degrade to no-ops and self-heal on reset.
        log::error!("HAL init failed: {} — continuing without PWM output", e);
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            LedConfig::default()
        }
    };

    // ── 4. Construct the engine ───────────────────────────────
    let time_adapter = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    #[cfg(feature = "fx-strip")]
    let fx_interval_ms = config.fx_service_interval_ms;

    let mut manager = LedManager::new(config);

    // ── 5. Render backend (build-time selection) ──────────────
    #[cfg(feature = "pwm-rgb")]
    let mut backend = drivers::pwm_rgb::PwmRgbBackend::new();

    #[cfg(feature = "pixel-strip")]
    let mut backend = drivers::pixel_strip::PixelStripBackend::new();

    #[cfg(feature = "fx-strip")]
    let mut backend = {
        let shared = std::sync::Arc::new(drivers::fx_strip::FxShared::new());
        // The service thread owns the strip for the firmware's lifetime.
        let _fx = drivers::fx_strip::spawn_fx_service(shared.clone(), fx_interval_ms);
        drivers::fx_strip::FxStripBackend::new(shared)
    };

    info!("LED engine ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        let now_ms = time_adapter.uptime_ms();
        let delay = manager.poll(now_ms, &EVSE_LINK, &mut backend, &mut sink);
        wait_for_wake(delay);

        let now_ms = time_adapter.uptime_ms();
        events::drain_events(|event| match event {
            // The poll at the top of the loop re-reads the EVSE port and
            // re-arbitrates — nothing to do beyond waking up.
            Event::EvseStateChanged | Event::TimerWake => {}

            Event::NetworkChanged => {
                let (client, connected) = NET_STATUS.mode();
                manager.set_network_mode(client, connected);
            }

            Event::CommandReceived => {
                while let Some(cmd) = pop_command() {
                    if let Err(e) = manager.handle_command(cmd, &mut backend, &mut sink, now_ms) {
                        warn!("command rejected: {}", e);
                    }
                }
            }
        });
    }
}

/// Sleep until the manager's next wake is due or an external notification
/// arrives, whichever comes first.
fn wait_for_wake(delay: WakeDelay) {
    match delay {
        WakeDelay::After(ms) => {
            let deadline = Instant::now() + Duration::from_millis(u64::from(ms));
            while events::queue_is_empty() {
                let now = Instant::now();
                if now >= deadline {
                    events::push_event(Event::TimerWake);
                    break;
                }
                std::thread::sleep(WAKE_SLICE.min(deadline - now));
            }
        }
        WakeDelay::WhenNotified => {
            while events::queue_is_empty() {
                std::thread::sleep(WAKE_SLICE);
            }
        }
    }
}
