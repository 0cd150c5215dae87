//! LED manager — the cooperative task that owns the status display.
//!
//! The manager never runs on its own: the event loop calls [`LedManager::poll`]
//! whenever a collaborator notification, a queued command, or a previously
//! scheduled timed wake arrives.  Each poll expires due overrides,
//! re-arbitrates the display owner, resolves colour/brightness through the
//! override store, hands one [`Frame`] to the render backend, and reports
//! when it next wants to run.
//!
//! ```text
//!  EvseStatusPort ──▶ ┌─────────────────────────┐ ──▶ RenderBackend
//!  NetworkMode ─────▶ │        LedManager        │
//!  LedCommand ──────▶ │  Arbiter · OverrideStore │ ──▶ EventSink
//!                     └─────────────────────────┘
//! ```
//!
//! State changes take effect on the next poll; the event loop re-polls
//! immediately after draining notifications, which is the "schedule an
//! immediate wake" of the arbitration contract.

use log::{info, warn};

use crate::app::commands::LedCommand;
use crate::app::events::LedEvent;
use crate::app::ports::{EffectMode, EvseStatusPort, EventSink, Frame, RenderBackend};
use crate::config::LedConfig;
use crate::error::Result;
use crate::led::arbiter::{self, LedState, NetworkMode, TestStep};
use crate::led::overrides::{self, OverrideStore};
use crate::led::palette::{Palette, Rgb};

/// How long the manager wants to sleep after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeDelay {
    /// Wake again after this many milliseconds.
    After(u32),
    /// Sleep until an external notification arrives.
    WhenNotified,
}

// Network indicator colours (full-intensity primaries — these are alarm
// signals, not palette subjects).
const NET_AP_WAITING: Rgb = Rgb::new(255, 255, 0);
const NET_AP_CONNECTED: Rgb = Rgb::new(255, 0, 255);
const NET_CLIENT_CONNECTING: Rgb = Rgb::new(0, 255, 255);
const NET_CLIENT_CONNECTED: Rgb = Rgb::new(0, 255, 0);

pub struct LedManager {
    state: LedState,
    net: NetworkMode,
    /// Flash phase for the transitional network states.
    flash_on: bool,
    /// Process-wide brightness; read at resolution time, never cached.
    brightness: u8,
    overrides: OverrideStore,
    palette: Palette,
    config: LedConfig,
    /// Diagnostic colour hold (set by `TestColour`, released by `Clear`).
    test_hold: Option<Rgb>,
}

impl LedManager {
    /// Construct the manager.  Boot starts with the self-test sequence;
    /// the arbiter takes over once it completes.
    pub fn new(config: LedConfig) -> Self {
        Self {
            state: LedState::SelfTest(TestStep::Red),
            net: NetworkMode::default(),
            flash_on: false,
            brightness: config.default_brightness,
            palette: Palette::from_config(&config),
            config,
            overrides: OverrideStore::new(),
            test_hold: None,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> LedState {
        self.state
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    // ── Collaborator notifications ────────────────────────────

    /// Record the network phase pushed by the WiFi manager.  The new phase
    /// is arbitrated on the next poll.
    pub fn set_network_mode(&mut self, client: bool, connected: bool) {
        let net = NetworkMode { client, connected };
        if net != self.net {
            info!("network mode: client={} connected={}", client, connected);
            self.net = net;
        }
    }

    // ── Request boundary ──────────────────────────────────────

    /// Apply a parsed command from the web/MQTT boundary.
    ///
    /// `InvalidCategory` is returned to the caller for unknown override
    /// names; the store is left untouched.  The event loop polls right
    /// after, so accepted mutations reach the hardware immediately.
    pub fn handle_command(
        &mut self,
        cmd: LedCommand,
        backend: &mut impl RenderBackend,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Result<()> {
        match cmd {
            LedCommand::SetOverride {
                category,
                colour,
                brightness,
                timeout_hours,
            } => {
                let timeout_ms = u64::from(timeout_hours) * 3_600_000;
                self.overrides.set_by_name(
                    category.as_str(),
                    colour,
                    brightness,
                    Some(timeout_ms),
                    now_ms,
                )?;
                // from_name succeeded inside set_by_name; re-parse for the event.
                if let Some(c) = overrides::OverrideCategory::from_name(category.as_str()) {
                    sink.emit(&LedEvent::OverrideSet(c));
                }
            }

            LedCommand::ClearOverride(name) => {
                self.overrides.clear_by_name(name.as_deref())?;
                let category = name
                    .as_deref()
                    .and_then(|n| overrides::OverrideCategory::from_name(n));
                sink.emit(&LedEvent::OverrideCleared(category));
            }

            LedCommand::SetBrightness(value) => {
                self.brightness = value;
                sink.emit(&LedEvent::BrightnessChanged(value));
            }

            LedCommand::RunSelfTest => {
                self.test_hold = None;
                self.state = LedState::SelfTest(TestStep::Red);
                sink.emit(&LedEvent::SelfTestStarted);
            }

            LedCommand::TestColour(colour) => {
                // Diagnostic path — straight to the hardware, and held
                // there until an explicit Clear releases it.
                self.test_hold = Some(colour);
                backend.render(&Frame::steady(colour, self.brightness));
            }

            LedCommand::Clear => {
                self.test_hold = None;
                self.state = LedState::Off;
            }
        }
        Ok(())
    }

    // ── Core poll ─────────────────────────────────────────────

    /// Run one arbitration/render pass and report the next wake.
    pub fn poll(
        &mut self,
        now_ms: u64,
        evse: &impl EvseStatusPort,
        backend: &mut impl RenderBackend,
        sink: &mut impl EventSink,
    ) -> WakeDelay {
        if self.overrides.check_timeouts(now_ms) {
            sink.emit(&LedEvent::OverrideExpired);
        }

        if let Some(colour) = self.test_hold {
            backend.render(&Frame::steady(colour, self.brightness));
            return self.bounded(WakeDelay::WhenNotified, now_ms);
        }

        let winner = arbiter::evaluate(self.state, evse.is_fault(), self.net);
        self.transition_to(winner, sink);

        let delay = self.render_current(evse, backend);
        self.bounded(delay, now_ms)
    }

    fn transition_to(&mut self, new_state: LedState, sink: &mut impl EventSink) {
        if new_state != self.state {
            sink.emit(&LedEvent::StateChanged {
                from: self.state,
                to: new_state,
            });
            self.state = new_state;
        }
    }

    /// Cap the requested sleep by the soonest pending override expiry, so
    /// a timed override never lingers past its deadline just because the
    /// display is otherwise idle.
    fn bounded(&self, delay: WakeDelay, now_ms: u64) -> WakeDelay {
        match (delay, self.overrides.next_timeout_deadline(now_ms)) {
            (WakeDelay::After(d), Some(t)) => {
                WakeDelay::After((u64::from(d)).min(t).min(u64::from(u32::MAX)) as u32)
            }
            (WakeDelay::WhenNotified, Some(t)) => {
                WakeDelay::After(t.min(u64::from(u32::MAX)) as u32)
            }
            (d, None) => d,
        }
    }

    // ── Rendering ─────────────────────────────────────────────

    fn render_current(
        &mut self,
        evse: &impl EvseStatusPort,
        backend: &mut impl RenderBackend,
    ) -> WakeDelay {
        match self.state {
            LedState::Off => {
                // Even "off" is overridable — the `off` slot can light a
                // dark charger.
                let colour = self
                    .overrides
                    .resolve_colour(overrides::OverrideCategory::Off, Rgb::BLACK);
                let brightness = self
                    .overrides
                    .resolve_brightness(overrides::OverrideCategory::Off, self.brightness);
                backend.render(&Frame::steady(colour, brightness));
                WakeDelay::WhenNotified
            }

            LedState::SelfTest(step) => {
                let (colour, next) = match step {
                    TestStep::Red => (Rgb::new(255, 0, 0), LedState::SelfTest(TestStep::Green)),
                    TestStep::Green => (Rgb::new(0, 255, 0), LedState::SelfTest(TestStep::Blue)),
                    TestStep::Blue => (Rgb::new(0, 0, 255), LedState::Off),
                };
                backend.render(&Frame::steady(colour, self.brightness));
                if next == LedState::Off {
                    // Sequence complete: hand the display back to the
                    // arbiter, but let the blue step finish its dwell
                    // before the new owner paints.
                    self.state = arbiter::evaluate(LedState::Off, evse.is_fault(), self.net);
                } else {
                    self.state = next;
                }
                WakeDelay::After(self.config.test_step_ms)
            }

            LedState::EvseStatus => {
                let (colour, brightness) = self.resolve_status(evse);
                let (effect, speed_ms) = if evse.is_charging() {
                    (EffectMode::ColorWipe, self.charge_speed(evse))
                } else if evse.is_fault() {
                    (EffectMode::Fade, self.config.fx_default_speed_ms)
                } else {
                    (EffectMode::Static, self.config.fx_default_speed_ms)
                };
                backend.render(&Frame {
                    status: colour,
                    network: None,
                    brightness,
                    effect,
                    speed_ms,
                });
                WakeDelay::WhenNotified
            }

            LedState::ApWaiting
            | LedState::ApConnected
            | LedState::ClientConnecting
            | LedState::ClientConnected => self.render_network(evse, backend),
        }
    }

    fn render_network(
        &mut self,
        evse: &impl EvseStatusPort,
        backend: &mut impl RenderBackend,
    ) -> WakeDelay {
        let (colour, brightness) = self.resolve_status(evse);
        let cfg = &self.config;

        let (indicator, effect, speed_ms, delay) = match self.state {
            LedState::ApWaiting => (
                self.flash(NET_AP_WAITING),
                EffectMode::Blink,
                cfg.fx_connecting_speed_ms,
                WakeDelay::After(cfg.connecting_flash_ms),
            ),
            LedState::ApConnected => (
                self.flash(NET_AP_CONNECTED),
                EffectMode::Fade,
                cfg.fx_connected_speed_ms,
                WakeDelay::After(cfg.connected_flash_ms),
            ),
            LedState::ClientConnecting => (
                self.flash(NET_CLIENT_CONNECTING),
                EffectMode::Fade,
                cfg.fx_connecting_speed_ms,
                WakeDelay::After(cfg.connecting_flash_ms),
            ),
            LedState::ClientConnected => (
                NET_CLIENT_CONNECTED,
                EffectMode::Fade,
                cfg.fx_connected_speed_ms,
                WakeDelay::WhenNotified,
            ),
            // Only network states reach this function.
            _ => unreachable!("render_network called for {:?}", self.state),
        };

        if delay != WakeDelay::WhenNotified {
            self.flash_on = !self.flash_on;
        }

        backend.render(&Frame {
            status: colour,
            network: Some(indicator),
            brightness,
            effect,
            speed_ms,
        });
        delay
    }

    /// Resolve the EVSE status colour and brightness through the override
    /// store, keyed by *condition* (never by the rendered colour class).
    fn resolve_status(&self, evse: &impl EvseStatusPort) -> (Rgb, u8) {
        let class = evse.colour_class();
        let condition = overrides::classify_evse(evse.is_fault(), evse.is_charging(), class);
        let computed = self.palette.colour(class);

        match overrides::category_for_state(self.state, condition) {
            Some(category) => (
                self.overrides.resolve_colour(category, computed),
                self.overrides.resolve_brightness(category, self.brightness),
            ),
            None => (computed, self.brightness),
        }
    }

    fn flash(&self, colour: Rgb) -> Rgb {
        if self.flash_on { colour } else { Rgb::BLACK }
    }

    /// Charging animation speed: linear slow→fast as charge current rises
    /// towards the hardware maximum.  An unset maximum (0 A) falls back to
    /// the default speed instead of dividing by zero.
    fn charge_speed(&self, evse: &impl EvseStatusPort) -> u16 {
        let max = evse.max_hardware_current_a();
        if max <= 0.0 {
            warn!("max hardware current unset, using default fx speed");
            return self.config.fx_default_speed_ms;
        }
        let ratio = (evse.charge_current_a() / max).clamp(0.0, 1.0);
        let slow = f32::from(self.config.fx_charge_slow_ms);
        let fast = f32::from(self.config.fx_charge_fast_ms);
        (slow - ratio * (slow - fast)) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::palette::ColorClass;

    struct FakeEvse {
        class: ColorClass,
        charging: bool,
        fault: bool,
        current: f32,
        max_current: f32,
    }

    impl Default for FakeEvse {
        fn default() -> Self {
            Self {
                class: ColorClass::Green,
                charging: false,
                fault: false,
                current: 0.0,
                max_current: 32.0,
            }
        }
    }

    impl EvseStatusPort for FakeEvse {
        fn colour_class(&self) -> ColorClass {
            self.class
        }
        fn is_charging(&self) -> bool {
            self.charging
        }
        fn is_fault(&self) -> bool {
            self.fault
        }
        fn charge_current_a(&self) -> f32 {
            self.current
        }
        fn max_hardware_current_a(&self) -> f32 {
            self.max_current
        }
    }

    struct NullBackend;
    impl RenderBackend for NullBackend {
        fn render(&mut self, _frame: &Frame) {}
    }

    struct NullSink;
    impl EventSink for NullSink {
        fn emit(&mut self, _event: &LedEvent) {}
    }

    #[test]
    fn charge_speed_interpolates_between_slow_and_fast() {
        let mgr = LedManager::new(LedConfig::default());
        let mut evse = FakeEvse::default();

        evse.current = 0.0;
        assert_eq!(mgr.charge_speed(&evse), 2000);
        evse.current = 32.0;
        assert_eq!(mgr.charge_speed(&evse), 1000);
        evse.current = 16.0;
        assert_eq!(mgr.charge_speed(&evse), 1500);
        // Currents above the hardware maximum clamp to the fast end.
        evse.current = 64.0;
        assert_eq!(mgr.charge_speed(&evse), 1000);
    }

    #[test]
    fn zero_max_current_falls_back_to_default_speed() {
        let mgr = LedManager::new(LedConfig::default());
        let evse = FakeEvse {
            current: 16.0,
            max_current: 0.0,
            ..Default::default()
        };
        assert_eq!(mgr.charge_speed(&evse), 1000);
    }

    #[test]
    fn boot_starts_in_self_test() {
        let mgr = LedManager::new(LedConfig::default());
        assert_eq!(mgr.state(), LedState::SelfTest(TestStep::Red));
    }

    #[test]
    fn poll_sleep_is_bounded_by_override_deadline() {
        let mut mgr = LedManager::new(LedConfig::default());
        let evse = FakeEvse::default();
        let (mut backend, mut sink) = (NullBackend, NullSink);
        mgr.set_network_mode(true, true);
        // Run the self-test out so the display settles on a steady state.
        for _ in 0..4 {
            mgr.poll(0, &evse, &mut backend, &mut sink);
        }
        assert_eq!(mgr.state(), LedState::EvseStatus);

        mgr.overrides.set(
            crate::led::overrides::OverrideCategory::Ready,
            Rgb::new(1, 1, 1),
            None,
            Some(30_000),
            0,
        );
        // The steady state would sleep forever; the deadline bounds it.
        assert_eq!(
            mgr.poll(0, &evse, &mut backend, &mut sink),
            WakeDelay::After(30_000)
        );
    }

    #[test]
    fn flash_phase_toggles_on_timed_network_states() {
        let mut mgr = LedManager::new(LedConfig::default());
        let evse = FakeEvse::default();
        let mut backend = NullBackend;

        mgr.state = LedState::ApWaiting;
        let before = mgr.flash_on;
        let delay = mgr.render_network(&evse, &mut backend);
        assert_eq!(delay, WakeDelay::After(450));
        assert_ne!(mgr.flash_on, before);

        // Steady states leave the phase alone.
        mgr.state = LedState::ClientConnected;
        let before = mgr.flash_on;
        let delay = mgr.render_network(&evse, &mut backend);
        assert_eq!(delay, WakeDelay::WhenNotified);
        assert_eq!(mgr.flash_on, before);
    }
}
