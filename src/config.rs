//! LED subsystem configuration parameters
//!
//! All tunable parameters for the status LED engine: the named palette
//! colours, the default global brightness, and the timing constants for the
//! self-test / flash / effect cadences.  Values can be overridden via NVS
//! (non-volatile storage) or the web UI.  Colour overrides themselves are
//! deliberately NOT part of this struct — they are ephemeral and never
//! survive a restart.

use serde::{Deserialize, Serialize};

/// Core LED configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedConfig {
    // --- Named palette colours (24-bit 0xRRGGBB) ---
    /// Colour class "off" — display dark
    pub colour_off: u32,
    /// Colour class "red" — fault display
    pub colour_red: u32,
    /// Colour class "green" — ready display
    pub colour_green: u32,
    /// Colour class "yellow" — vehicle-connected display
    pub colour_yellow: u32,
    /// Colour class "blue"
    pub colour_blue: u32,
    /// Colour class "violet"
    pub colour_violet: u32,
    /// Colour class "teal" — charging display
    pub colour_teal: u32,
    /// Colour class "white" — fallback for unknown codes
    pub colour_white: u32,

    // --- Brightness ---
    /// Global brightness applied to all non-overridden categories (0-255)
    pub default_brightness: u8,

    // --- Timing ---
    /// Delay between power-on self-test steps (milliseconds)
    pub test_step_ms: u32,
    /// Flash half-period while a network phase is still transitional
    pub connecting_flash_ms: u32,
    /// Flash half-period once an AP client has associated
    pub connected_flash_ms: u32,

    // --- Effects engine ---
    /// Default animation speed (milliseconds per cycle)
    pub fx_default_speed_ms: u16,
    /// Animation speed while a network phase is transitional
    pub fx_connecting_speed_ms: u16,
    /// Animation speed once the network is fully up
    pub fx_connected_speed_ms: u16,
    /// Charging animation speed at zero charge current (slow end)
    pub fx_charge_slow_ms: u16,
    /// Charging animation speed at maximum hardware current (fast end)
    pub fx_charge_fast_ms: u16,
    /// Poll period of the effects service thread
    pub fx_service_interval_ms: u32,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            // CSS-inspired palette — friendlier than saturated primaries
            colour_off: 0x000000,    // Black
            colour_red: 0xFF6347,    // Tomato
            colour_green: 0x32CD32,  // LimeGreen
            colour_yellow: 0xFFD700, // Gold
            colour_blue: 0x1E90FF,   // DodgerBlue
            colour_violet: 0xBA55D3, // MediumOrchid
            colour_teal: 0x48D1CC,   // MediumTurquoise
            colour_white: 0xFFFFFF,  // White

            default_brightness: 255,

            test_step_ms: 500,
            connecting_flash_ms: 450,
            connected_flash_ms: 250,

            fx_default_speed_ms: 1000,
            fx_connecting_speed_ms: 2000,
            fx_connected_speed_ms: 1000,
            fx_charge_slow_ms: 2000,
            fx_charge_fast_ms: 1000,
            fx_service_interval_ms: 5,
        }
    }
}
