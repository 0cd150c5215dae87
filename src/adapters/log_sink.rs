//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured LED events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).  The MQTT
//! status publisher implements the same trait on the gateway side.

use log::info;

use crate::app::events::LedEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`LedEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LedEvent) {
        match event {
            LedEvent::StateChanged { from, to } => {
                info!("LED   | {:?} -> {:?}", from, to);
            }
            LedEvent::OverrideSet(category) => {
                info!("OVRD  | '{}' set", category.name());
            }
            LedEvent::OverrideExpired => {
                info!("OVRD  | timed override expired");
            }
            LedEvent::OverrideCleared(Some(category)) => {
                info!("OVRD  | '{}' cleared", category.name());
            }
            LedEvent::OverrideCleared(None) => {
                info!("OVRD  | all slots cleared");
            }
            LedEvent::BrightnessChanged(value) => {
                info!("LED   | brightness={}", value);
            }
            LedEvent::SelfTestStarted => {
                info!("LED   | self-test sequence started");
            }
        }
    }
}
