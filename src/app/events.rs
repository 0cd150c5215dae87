//! Outbound application events.
//!
//! The [`LedManager`](crate::led::manager::LedManager) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, publish to the MQTT
//! status topic, etc.

use crate::led::arbiter::LedState;
use crate::led::overrides::OverrideCategory;

/// Structured events emitted by the LED engine.
#[derive(Debug, Clone)]
pub enum LedEvent {
    /// The arbiter moved the display to a new state.
    StateChanged { from: LedState, to: LedState },

    /// An override slot was activated from the request boundary.
    OverrideSet(OverrideCategory),

    /// An override slot reached its deadline and was deactivated.
    OverrideExpired,

    /// One or all override slots were explicitly cleared.
    OverrideCleared(Option<OverrideCategory>),

    /// The global brightness changed.
    BrightnessChanged(u8),

    /// A power-on / manual self-test sequence started.
    SelfTestStarted,
}
