//! GPIO / peripheral pin assignments for the gateway main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Discrete RGB status LED (common-cathode, LEDC PWM)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 11;
pub const LED_G_GPIO: i32 = 12;
pub const LED_B_GPIO: i32 = 13;

/// LEDC base frequency for the RGB status LED (5 kHz, 8-bit resolution).
pub const LED_PWM_FREQ_HZ: u32 = 5_000;

// ---------------------------------------------------------------------------
// Addressable pixel strip (WS2812B over RMT)
// ---------------------------------------------------------------------------

/// Data pin for the WS2812B strip.
pub const STRIP_GPIO: u32 = 4;
/// Number of pixels on the strip.
pub const STRIP_LENGTH: usize = 8;
/// Pixel reserved for the network indicator, if the board has one.
/// `None` means the whole strip shows the status colour.
pub const NETWORK_PIXEL: Option<usize> = Some(0);
