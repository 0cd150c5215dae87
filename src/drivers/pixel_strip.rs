//! Addressable pixel-strip backend (WS2812B).
//!
//! The whole strip shows the resolved status colour; one pixel may be
//! reserved as a network indicator ([`pins::NETWORK_PIXEL`]), in which
//! case both are blended into the same hardware flush.  Gamma correction
//! and brightness are applied by the pixel write path
//! (`smart_leds::gamma` / `smart_leds::brightness`) rather than a local
//! lookup table.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: flushes over the RMT peripheral via `ws2812-esp32-rmt-driver`.
//! On host/test: keeps the logical pixel buffer in-memory only.

use smart_leds::RGB8;

use crate::app::ports::{Frame, RenderBackend};
use crate::led::palette::Rgb;
use crate::pins;

#[cfg(target_os = "espidf")]
use log::warn;
#[cfg(target_os = "espidf")]
use smart_leds::{SmartLedsWrite, brightness, gamma};
#[cfg(target_os = "espidf")]
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

fn to_rgb8(c: Rgb) -> RGB8 {
    RGB8::new(c.r, c.g, c.b)
}

pub struct PixelStripBackend {
    /// Logical pixel buffer (pre gamma/brightness).
    buffer: [RGB8; pins::STRIP_LENGTH],
    brightness: u8,
    #[cfg(target_os = "espidf")]
    driver: Option<Ws2812Esp32Rmt<'static>>,
}

impl PixelStripBackend {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        // SAFETY: the RMT channel and strip GPIO are owned exclusively by
        // this backend; nothing else in the firmware touches them.  The
        // stolen pin type must match pins::STRIP_GPIO.
        let channel = unsafe { esp_idf_hal::rmt::CHANNEL0::new() };
        let pin = unsafe { esp_idf_hal::gpio::Gpio4::new() };
        let driver = match Ws2812Esp32Rmt::new(channel, pin) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("pixel strip init failed ({e:?}), rendering disabled");
                None
            }
        };
        Self {
            buffer: [RGB8::default(); pins::STRIP_LENGTH],
            brightness: 0,
            driver,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            buffer: [RGB8::default(); pins::STRIP_LENGTH],
            brightness: 0,
        }
    }

    /// Logical buffer contents (host inspection / tests).
    pub fn pixels(&self) -> &[RGB8] {
        &self.buffer
    }

    #[cfg(target_os = "espidf")]
    fn flush(&mut self) {
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        let frame = brightness(gamma(self.buffer.iter().copied()), self.brightness);
        // A dropped frame is harmless — the next resolution repaints.
        if let Err(e) = driver.write(frame) {
            warn!("pixel strip write failed: {e:?}");
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn flush(&mut self) {}
}

impl RenderBackend for PixelStripBackend {
    fn render(&mut self, frame: &Frame) {
        self.buffer.fill(to_rgb8(frame.status));
        if let Some(network) = frame.network {
            if let Some(index) = pins::NETWORK_PIXEL {
                self.buffer[index] = to_rgb8(network);
            }
        }
        self.brightness = frame.brightness;
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::EffectMode;

    #[test]
    fn status_colour_fills_the_strip() {
        let mut backend = PixelStripBackend::new();
        backend.render(&Frame::steady(Rgb::new(0x32, 0xCD, 0x32), 255));
        assert!(backend.pixels().iter().all(|&p| p == RGB8::new(0x32, 0xCD, 0x32)));
    }

    #[test]
    fn network_pixel_is_blended_into_the_same_frame() {
        let mut backend = PixelStripBackend::new();
        backend.render(&Frame {
            status: Rgb::new(10, 20, 30),
            network: Some(Rgb::new(255, 255, 0)),
            brightness: 255,
            effect: EffectMode::Static,
            speed_ms: 0,
        });
        let idx = pins::NETWORK_PIXEL.unwrap();
        assert_eq!(backend.pixels()[idx], RGB8::new(255, 255, 0));
        let others = backend
            .pixels()
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != idx)
            .all(|(_, &p)| p == RGB8::new(10, 20, 30));
        assert!(others);
    }
}
