//! Bridge from the rest of the gateway firmware into the LED engine.
//!
//! The EVSE serial link task and the WiFi manager run outside this
//! subsystem; they publish their latest status here (plain atomics — each
//! field is a whole word) and signal the event queue.  The LED event loop
//! reads the snapshot on its next wake via [`EvseStatusPort`].

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::app::ports::EvseStatusPort;
use crate::events::{Event, push_event};
use crate::led::palette::ColorClass;

/// Latest EVSE controller status, as published by the serial-link task.
pub struct EvseLink {
    colour_code: AtomicU8,
    charging: AtomicBool,
    fault: AtomicBool,
    /// f32 bit patterns — amps.
    charge_current: AtomicU32,
    max_current: AtomicU32,
}

/// The one instance the serial-link task writes and the LED loop reads.
pub static EVSE_LINK: EvseLink = EvseLink::new();

impl EvseLink {
    pub const fn new() -> Self {
        Self {
            colour_code: AtomicU8::new(ColorClass::Green as u8),
            charging: AtomicBool::new(false),
            fault: AtomicBool::new(false),
            charge_current: AtomicU32::new(0),
            max_current: AtomicU32::new(0),
        }
    }

    /// Publish a fresh controller status and wake the LED task.
    pub fn update(
        &self,
        colour_code: u8,
        charging: bool,
        fault: bool,
        charge_current_a: f32,
        max_current_a: f32,
    ) {
        self.colour_code.store(colour_code, Ordering::Relaxed);
        self.charging.store(charging, Ordering::Relaxed);
        self.fault.store(fault, Ordering::Relaxed);
        self.charge_current
            .store(charge_current_a.to_bits(), Ordering::Relaxed);
        self.max_current
            .store(max_current_a.to_bits(), Ordering::Relaxed);
        push_event(Event::EvseStateChanged);
    }
}

impl EvseStatusPort for EvseLink {
    fn colour_class(&self) -> ColorClass {
        ColorClass::from_code(self.colour_code.load(Ordering::Relaxed))
    }

    fn is_charging(&self) -> bool {
        self.charging.load(Ordering::Relaxed)
    }

    fn is_fault(&self) -> bool {
        self.fault.load(Ordering::Relaxed)
    }

    fn charge_current_a(&self) -> f32 {
        f32::from_bits(self.charge_current.load(Ordering::Relaxed))
    }

    fn max_hardware_current_a(&self) -> f32 {
        f32::from_bits(self.max_current.load(Ordering::Relaxed))
    }
}

/// Latest network phase, as pushed by the WiFi manager.
pub struct NetworkStatus {
    client: AtomicBool,
    connected: AtomicBool,
}

pub static NET_STATUS: NetworkStatus = NetworkStatus::new();

impl NetworkStatus {
    pub const fn new() -> Self {
        Self {
            client: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    /// Publish a phase change and wake the LED task.
    pub fn set_mode(&self, client: bool, connected: bool) {
        self.client.store(client, Ordering::Relaxed);
        self.connected.store(connected, Ordering::Relaxed);
        push_event(Event::NetworkChanged);
    }

    pub fn mode(&self) -> (bool, bool) {
        (
            self.client.load(Ordering::Relaxed),
            self.connected.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_readable_through_the_port() {
        let link = EvseLink::new();
        link.update(6, true, false, 16.5, 32.0);
        assert_eq!(link.colour_class(), ColorClass::Teal);
        assert!(link.is_charging());
        assert!(!link.is_fault());
        assert!((link.charge_current_a() - 16.5).abs() < f32::EPSILON);
        assert!((link.max_hardware_current_a() - 32.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_colour_code_degrades_to_white() {
        let link = EvseLink::new();
        link.update(99, false, false, 0.0, 0.0);
        assert_eq!(link.colour_class(), ColorClass::White);
    }
}
