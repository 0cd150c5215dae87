//! Port traits — the hexagonal boundary between the LED engine and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LedManager (domain)
//! ```
//!
//! Driven adapters (the EVSE link, render backends, event sinks, config
//! storage) implement these traits.  The [`LedManager`](crate::led::manager::LedManager)
//! consumes them via generics, so the arbitration core never touches
//! hardware directly and the whole engine runs under host tests.

use crate::config::LedConfig;
use crate::led::palette::{ColorClass, Rgb};

// ───────────────────────────────────────────────────────────────
// EVSE status port (driven adapter: charge controller → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port onto the charge-state controller.
///
/// The controller additionally fires a change notification
/// ([`Event::EvseStateChanged`](crate::events::Event::EvseStateChanged))
/// on every state transition; the getters here are polled on wake.
pub trait EvseStatusPort {
    /// Abstract colour class the controller wants displayed.
    fn colour_class(&self) -> ColorClass;

    /// Whether a charge session is actively delivering current.
    fn is_charging(&self) -> bool;

    /// Whether the controller reports a fault condition.
    fn is_fault(&self) -> bool;

    /// Present charge current in amps.
    fn charge_current_a(&self) -> f32;

    /// Maximum current the hardware supports, in amps.  May be 0.0 when
    /// the controller has not reported it yet.
    fn max_hardware_current_a(&self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Render backend port (domain → LED hardware)
// ───────────────────────────────────────────────────────────────

/// Animation mode for backends that support effects.  The plain backends
/// ignore it — flashing is driven by the manager's timed re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EffectMode {
    #[default]
    Static = 0,
    Blink = 1,
    Fade = 2,
    ColorWipe = 3,
}

impl EffectMode {
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Blink,
            2 => Self::Fade,
            3 => Self::ColorWipe,
            _ => Self::Static,
        }
    }
}

/// One resolved display frame, produced by each arbitration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Resolved status colour (overrides already applied).
    pub status: Rgb,
    /// Network indicator colour, when the current state carries one.
    /// Backends without a dedicated indicator give it the whole output.
    pub network: Option<Rgb>,
    /// Effective brightness, resolved at render time.
    pub brightness: u8,
    /// Animation mode (effects backend only).
    pub effect: EffectMode,
    /// Animation speed in ms per cycle (effects backend only).
    pub speed_ms: u16,
}

impl Frame {
    /// A steady frame with no network indication or animation.
    pub fn steady(status: Rgb, brightness: u8) -> Self {
        Self {
            status,
            network: None,
            brightness,
            effect: EffectMode::Static,
            speed_ms: 0,
        }
    }
}

/// Write-side port: the manager hands every resolved frame to exactly one
/// backend, selected at build time.  Hardware write failures are swallowed
/// (warn-logged) inside the adapter — a dropped frame is harmless and is
/// superseded by the next resolution.
pub trait RenderBackend {
    fn render(&mut self, frame: &Frame);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`LedEvent`](super::events::LedEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT
/// status topic, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LedEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the LED configuration.
///
/// Implementations MUST validate before persisting — invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
/// Colour overrides are never routed through this port: they are ephemeral
/// by contract.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`LedConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<LedConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &LedConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
