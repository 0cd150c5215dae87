//! Discrete PWM RGB backend.
//!
//! Drives three LEDC channels (one per colour).  Each channel value is
//! scaled by the frame brightness with a fixed-point multiply-and-shift,
//! then gamma-corrected through a 256-entry lookup table before the duty
//! write — LEDs are perceptually very non-linear and raw duty values wash
//! out the low end.
//!
//! A single RGB package cannot show a status and a network colour at the
//! same time, so a frame carrying a network indication gives it the whole
//! output (the flash cadence comes from the manager's timed re-renders).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes three LEDC PWM duty cycles via hw_init.
//! On host/test: tracks the last written triple in-memory only.

use crate::app::ports::{Frame, RenderBackend};
use crate::drivers::hw_init;
use crate::led::palette::Rgb;

// https://learn.adafruit.com/led-tricks-gamma-correction/the-quick-fix
#[rustfmt::skip]
const GAMMA8: [u8; 256] = [
      0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,
      0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  1,  1,  1,  1,
      1,  1,  1,  1,  1,  1,  1,  1,  1,  2,  2,  2,  2,  2,  2,  2,
      2,  3,  3,  3,  3,  3,  3,  3,  4,  4,  4,  4,  4,  5,  5,  5,
      5,  6,  6,  6,  6,  7,  7,  7,  7,  8,  8,  8,  9,  9,  9, 10,
     10, 10, 11, 11, 11, 12, 12, 13, 13, 13, 14, 14, 15, 15, 16, 16,
     17, 17, 18, 18, 19, 19, 20, 20, 21, 21, 22, 22, 23, 24, 24, 25,
     25, 26, 27, 27, 28, 29, 29, 30, 31, 32, 32, 33, 34, 35, 35, 36,
     37, 38, 39, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 50,
     51, 52, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 66, 67, 68,
     69, 70, 72, 73, 74, 75, 77, 78, 79, 81, 82, 83, 85, 86, 87, 89,
     90, 92, 93, 95, 96, 98, 99,101,102,104,105,107,109,110,112,114,
    115,117,119,120,122,124,126,127,129,131,133,135,137,138,140,142,
    144,146,148,150,152,154,156,158,160,162,164,167,169,171,173,175,
    177,180,182,184,186,189,191,193,196,198,200,203,205,208,210,213,
    215,218,220,223,225,228,231,233,236,239,241,244,247,249,252,255,
];

/// Brightness-scale then gamma-correct one channel value.
fn correct(value: u8, brightness: u8) -> u8 {
    let scaled = ((value as u16 * (brightness as u16 + 1)) >> 8) as u8;
    GAMMA8[scaled as usize]
}

pub struct PwmRgbBackend {
    current: (u8, u8, u8),
}

impl PwmRgbBackend {
    pub fn new() -> Self {
        Self { current: (0, 0, 0) }
    }

    /// Last duty triple written to the channels (post gamma).
    pub fn current_duty(&self) -> (u8, u8, u8) {
        self.current
    }

    fn write(&mut self, colour: Rgb, brightness: u8) {
        let r = correct(colour.r, brightness);
        let g = correct(colour.g, brightness);
        let b = correct(colour.b, brightness);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_R, r);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_G, g);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_B, b);
        self.current = (r, g, b);
    }
}

impl RenderBackend for PwmRgbBackend {
    fn render(&mut self, frame: &Frame) {
        let colour = frame.network.unwrap_or(frame.status);
        self.write(colour, frame.brightness);
    }
}
