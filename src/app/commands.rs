//! Inbound commands to the LED engine.
//!
//! These represent actions requested by the outside world (web UI, MQTT,
//! serial console) that the [`LedManager`](crate::led::manager::LedManager)
//! interprets and acts upon.  The transport handlers parse their wire
//! payloads into [`LedCommand`]s, push them onto the bounded queue here,
//! and signal [`Event::CommandReceived`](crate::events::Event::CommandReceived)
//! so the event loop drains them on its next wake.

use std::sync::Mutex;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::led::palette::Rgb;

/// Bounded category-name string (the longest valid name is "charging").
pub type CategoryName = heapless::String<16>;

/// Commands that external adapters can send into the LED engine.
#[derive(Debug, Clone)]
pub enum LedCommand {
    /// Pin a status category to a colour, optionally with its own
    /// brightness and an auto-expiry in hours (0 = never expire).
    SetOverride {
        category: CategoryName,
        colour: Rgb,
        brightness: Option<u8>,
        timeout_hours: u32,
    },

    /// Release one override slot, or all of them when `None`.
    ClearOverride(Option<CategoryName>),

    /// Change the process-wide brightness.
    SetBrightness(u8),

    /// Run the Red→Green→Blue self-test sequence.
    RunSelfTest,

    /// Show a raw colour immediately, bypassing arbitration (diagnostic).
    TestColour(Rgb),

    /// Force the display off until the next state change.
    Clear,
}

// ───────────────────────────────────────────────────────────────
// Parsed web/MQTT payload
// ───────────────────────────────────────────────────────────────

/// The JSON body accepted by the `/api/led` endpoint and the MQTT
/// `led/override` topic.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRequest {
    /// Override category name (`off`, `error`, `ready`, `waiting`,
    /// `charging`, `custom`, `default`, `all`).
    pub state: CategoryName,
    /// `#RRGGBB` colour string.
    pub color: heapless::String<8>,
    /// Optional brightness override (1-255; 0 means "use global").
    pub brightness: Option<u8>,
    /// Auto-expiry in hours; absent or 0 means "never".
    pub timeout: Option<u32>,
}

impl OverrideRequest {
    /// Convert the parsed payload into a command.  Colour-string syntax
    /// errors are reported here; the category name is validated later by
    /// the override store so the error taxonomy stays in one place.
    pub fn into_command(self) -> Result<LedCommand> {
        let colour = parse_hex_colour(&self.color)?;
        Ok(LedCommand::SetOverride {
            category: self.state,
            colour,
            brightness: self.brightness,
            timeout_hours: self.timeout.unwrap_or(0),
        })
    }
}

/// Parse a `#RRGGBB` (or bare `RRGGBB`) colour string.
pub fn parse_hex_colour(s: &str) -> Result<Rgb> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(Error::Config("colour must be #RRGGBB"));
    }
    let raw = u32::from_str_radix(hex, 16).map_err(|_| Error::Config("colour must be #RRGGBB"))?;
    Ok(Rgb::from_u32(raw))
}

// ───────────────────────────────────────────────────────────────
// Bounded command queue
// ───────────────────────────────────────────────────────────────

const COMMAND_QUEUE_CAP: usize = 8;

static COMMAND_QUEUE: Mutex<heapless::Deque<LedCommand, COMMAND_QUEUE_CAP>> =
    Mutex::new(heapless::Deque::new());

/// Queue a command for the event loop.  Returns `false` when the queue is
/// full (the request boundary reports a busy error to its caller).
pub fn push_command(cmd: LedCommand) -> bool {
    let mut queue = COMMAND_QUEUE.lock().expect("command queue poisoned");
    let accepted = queue.push_back(cmd).is_ok();
    drop(queue);
    if accepted {
        crate::events::push_event(crate::events::Event::CommandReceived);
    }
    accepted
}

/// Pop the oldest pending command.  Called from the event loop only.
pub fn pop_command() -> Option<LedCommand> {
    COMMAND_QUEUE.lock().expect("command queue poisoned").pop_front()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_css_hex_colours() {
        assert_eq!(parse_hex_colour("#FF6347").unwrap(), Rgb::new(0xFF, 0x63, 0x47));
        assert_eq!(parse_hex_colour("32cd32").unwrap(), Rgb::new(0x32, 0xCD, 0x32));
        assert!(parse_hex_colour("#FFF").is_err());
        assert!(parse_hex_colour("#GGGGGG").is_err());
    }

    #[test]
    fn override_request_deserialises_from_json() {
        let body = r##"{"state":"charging","color":"#FFD700","brightness":128,"timeout":2}"##;
        let req: OverrideRequest = serde_json::from_str(body).unwrap();
        match req.into_command().unwrap() {
            LedCommand::SetOverride {
                category,
                colour,
                brightness,
                timeout_hours,
            } => {
                assert_eq!(category.as_str(), "charging");
                assert_eq!(colour, Rgb::new(0xFF, 0xD7, 0x00));
                assert_eq!(brightness, Some(128));
                assert_eq!(timeout_hours, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn minimal_request_defaults_to_no_timeout() {
        let body = r##"{"state":"all","color":"#000000"}"##;
        let req: OverrideRequest = serde_json::from_str(body).unwrap();
        match req.into_command().unwrap() {
            LedCommand::SetOverride {
                brightness,
                timeout_hours,
                ..
            } => {
                assert_eq!(brightness, None);
                assert_eq!(timeout_hours, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
